//! Visual and mix options for a reel.
//!
//! Every option is independent and has a default, so a job file may set
//! any subset of them.

use reelwright_common::{parse_flag, parse_override};
use serde::{Deserialize, Serialize};

use crate::job::JobError;

/// Style options carried by a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub captions: CaptionStyle,
    pub logo: LogoStyle,
    pub music: MusicMix,
}

/// Burned-in caption appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Burn captions into the video when a usable cue source exists.
    pub enabled: bool,
    pub font_size: u32,
    pub alignment: CaptionAlignment,
    /// Outline width in pixels.
    pub outline_width: f64,
    /// Opacity of the box drawn behind the text. `0.0` disables the box.
    pub background_opacity: f64,
    /// Vertical margin from the aligned edge, in pixels.
    pub margin_v: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            font_size: 48,
            alignment: CaptionAlignment::BottomCenter,
            outline_width: 2.0,
            background_opacity: 0.0,
            margin_v: 120,
        }
    }
}

/// Where captions sit on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionAlignment {
    #[default]
    BottomCenter,
    TopCenter,
    Center,
}

impl CaptionAlignment {
    /// Numpad-style alignment code used by ASS subtitle styles.
    pub fn ass_code(self) -> u8 {
        match self {
            CaptionAlignment::BottomCenter => 2,
            CaptionAlignment::TopCenter => 8,
            CaptionAlignment::Center => 5,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "bottom_center" | "bottom" => Some(Self::BottomCenter),
            "top_center" | "top" => Some(Self::TopCenter),
            "center" | "middle" => Some(Self::Center),
            _ => None,
        }
    }
}

/// Logo watermark placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoStyle {
    pub corner: LogoCorner,
    /// Target width in pixels; height follows the logo's aspect ratio.
    pub width: u32,
    /// Distance from the two nearest frame edges, in pixels.
    pub margin: u32,
    /// Opacity in `[0.0, 1.0]`.
    pub opacity: f64,
}

impl Default for LogoStyle {
    fn default() -> Self {
        Self {
            corner: LogoCorner::TopRight,
            width: 220,
            margin: 28,
            opacity: 0.85,
        }
    }
}

impl LogoStyle {
    /// Logo width that still fits inside a frame of `frame_width` with
    /// `margin` on both sides. Never below 1.
    pub fn effective_width(&self, frame_width: u32) -> u32 {
        let room = frame_width.saturating_sub(self.margin.saturating_mul(2));
        self.width.min(room).max(1)
    }

    /// Box the logo is scaled into: the effective width by the frame
    /// height less both margins. The logo keeps its aspect ratio inside it,
    /// so a tall logo is limited by height rather than width.
    pub fn fit_box(&self, frame_width: u32, frame_height: u32) -> (u32, u32) {
        let height = frame_height
            .saturating_sub(self.margin.saturating_mul(2))
            .max(1);
        (self.effective_width(frame_width), height)
    }
}

/// Corner placement for the logo overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogoCorner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl LogoCorner {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "top_left" => Some(Self::TopLeft),
            "top_right" => Some(Self::TopRight),
            "bottom_left" => Some(Self::BottomLeft),
            "bottom_right" => Some(Self::BottomRight),
            _ => None,
        }
    }

    pub fn is_left(self) -> bool {
        matches!(self, LogoCorner::TopLeft | LogoCorner::BottomLeft)
    }

    pub fn is_top(self) -> bool {
        matches!(self, LogoCorner::TopLeft | LogoCorner::TopRight)
    }
}

/// Background music mix settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicMix {
    /// Linear gain applied to the music bed.
    pub volume: f64,
    /// Seconds over which the mix renormalizes when an input ends.
    pub dropout_transition_secs: f64,
}

impl Default for MusicMix {
    fn default() -> Self {
        Self {
            volume: 0.15,
            dropout_transition_secs: 2.0,
        }
    }
}

impl StyleConfig {
    /// Apply `REELWRIGHT_*` style overrides from the process environment.
    pub fn with_env_overrides(mut self) -> Result<Self, JobError> {
        self.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Apply overrides from an arbitrary key lookup. Unset keys are left
    /// alone; unparseable values are rejected.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), JobError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("REELWRIGHT_CAPTIONS") {
            self.captions.enabled = parse_flag("REELWRIGHT_CAPTIONS", &raw)
                .map_err(|_| JobError::invalid_override("REELWRIGHT_CAPTIONS", &raw))?;
        }
        if let Some(raw) = lookup("REELWRIGHT_CAPTION_FONT_SIZE") {
            self.captions.font_size = parse_number("REELWRIGHT_CAPTION_FONT_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("REELWRIGHT_CAPTION_ALIGN") {
            self.captions.alignment = CaptionAlignment::parse(&raw)
                .ok_or_else(|| JobError::invalid_override("REELWRIGHT_CAPTION_ALIGN", &raw))?;
        }
        if let Some(raw) = lookup("REELWRIGHT_LOGO_CORNER") {
            self.logo.corner = LogoCorner::parse(&raw)
                .ok_or_else(|| JobError::invalid_override("REELWRIGHT_LOGO_CORNER", &raw))?;
        }
        if let Some(raw) = lookup("REELWRIGHT_LOGO_WIDTH") {
            self.logo.width = parse_number("REELWRIGHT_LOGO_WIDTH", &raw)?;
        }
        if let Some(raw) = lookup("REELWRIGHT_LOGO_OPACITY") {
            let opacity: f64 = parse_number("REELWRIGHT_LOGO_OPACITY", &raw)?;
            if !(0.0..=1.0).contains(&opacity) {
                return Err(JobError::invalid_override("REELWRIGHT_LOGO_OPACITY", &raw));
            }
            self.logo.opacity = opacity;
        }
        if let Some(raw) = lookup("REELWRIGHT_MUSIC_VOLUME") {
            let volume: f64 = parse_number("REELWRIGHT_MUSIC_VOLUME", &raw)?;
            if !volume.is_finite() || volume < 0.0 {
                return Err(JobError::invalid_override("REELWRIGHT_MUSIC_VOLUME", &raw));
            }
            self.music.volume = volume;
        }
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = vec![];
        if self.captions.font_size == 0 {
            problems.push("captions.font_size must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.captions.background_opacity) {
            problems.push("captions.background_opacity must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.logo.opacity) {
            problems.push("logo.opacity must be within [0, 1]".to_string());
        }
        if self.logo.width == 0 {
            problems.push("logo.width must be positive".to_string());
        }
        if !self.music.volume.is_finite() || self.music.volume < 0.0 {
            problems.push("music.volume must be a non-negative number".to_string());
        }
        if !self.music.dropout_transition_secs.is_finite() || self.music.dropout_transition_secs < 0.0
        {
            problems.push("music.dropout_transition_secs must be non-negative".to_string());
        }
        problems
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, JobError> {
    parse_override(key, raw).map_err(|_| JobError::invalid_override(key, raw))
}
