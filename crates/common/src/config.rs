//! Application configuration.
//!
//! The configuration is built once per run: read from disk, then patched
//! with environment overrides, then threaded explicitly through every
//! component call. Nothing reads the environment after that point.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReelError, ReelResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where rendered reels and thumbnails are written.
    pub output_dir: PathBuf,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Asset fetch settings.
    pub fetch: FetchConfig,

    /// External encoder settings.
    pub encoder: EncoderConfig,

    /// Thumbnail rendering settings.
    pub thumbnail: ThumbnailConfig,

    /// Narration script settings.
    pub narration: NarrationConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelwright=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Image fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Whether to try a higher-resolution variant of recognized image URLs
    /// before the original reference.
    pub upgrade_resolution: bool,

    /// Size (pixels) requested when rewriting an image reference.
    pub target_size_px: u32,

    /// User-Agent sent with HTTP fetches. Some image hosts reject requests
    /// without a browser-like agent.
    pub user_agent: String,
}

/// External encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Encoder binary name or path.
    pub binary: String,

    /// x264 preset.
    pub preset: String,

    /// x264 constant rate factor.
    pub crf: u32,

    /// AAC bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Kill the encoder if it runs longer than this. `None` waits forever.
    pub timeout_secs: Option<u64>,
}

/// Thumbnail settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Whether the pipeline renders a thumbnail after the video.
    pub enabled: bool,

    /// TrueType/OpenType font used for the title and badge. When unset,
    /// a list of common system font locations is searched.
    pub font_path: Option<PathBuf>,

    /// JPEG quality of the written thumbnail.
    pub jpeg_quality: u8,
}

/// Which product text drives the narration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NarrationSource {
    /// Reviews when available, feature bullets otherwise.
    #[default]
    ReviewsFirst,
    /// Feature bullets when available, reviews otherwise.
    FeaturesFirst,
    ReviewsOnly,
    FeaturesOnly,
}

impl NarrationSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "reviews_first" | "reviews-first" | "reviews" => Some(Self::ReviewsFirst),
            "features_first" | "features-first" | "features" => Some(Self::FeaturesFirst),
            "reviews_only" | "reviews-only" => Some(Self::ReviewsOnly),
            "features_only" | "features-only" => Some(Self::FeaturesOnly),
            _ => None,
        }
    }
}

/// Narration script settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub source: NarrationSource,

    /// Maximum number of review snippets read out.
    pub max_reviews: usize,

    /// Review snippets longer than this are shortened with an ellipsis.
    pub snippet_chars: usize,

    /// Affiliate tag appended to product links.
    pub affiliate_tag: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            logging: LoggingConfig::default(),
            fetch: FetchConfig::default(),
            encoder: EncoderConfig::default(),
            thumbnail: ThumbnailConfig::default(),
            narration: NarrationConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            upgrade_resolution: true,
            target_size_px: 1500,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/115.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            preset: "medium".to_string(),
            crf: 20,
            audio_bitrate_kbps: 192,
            timeout_secs: None,
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            font_path: None,
            jpeg_quality: 90,
        }
    }
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            source: NarrationSource::default(),
            max_reviews: 3,
            snippet_chars: 200,
            affiliate_tag: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`], a
    /// missing or malformed file is an error.
    pub fn load_from(path: &Path) -> ReelResult<Self> {
        if !path.exists() {
            return Err(ReelError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ReelError::config(format!("{}: {e}", path.display())))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Apply `REELWRIGHT_*` overrides from the process environment.
    pub fn with_env_overrides(mut self) -> ReelResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unset keys leave the current value alone; set keys that fail to
    /// parse are configuration errors.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ReelResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("REELWRIGHT_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("REELWRIGHT_FETCH_TIMEOUT_SECS") {
            self.fetch.timeout_secs = parse_override("REELWRIGHT_FETCH_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("REELWRIGHT_UPGRADE_IMAGES") {
            self.fetch.upgrade_resolution = parse_flag("REELWRIGHT_UPGRADE_IMAGES", &raw)?;
        }
        if let Some(font) = lookup("REELWRIGHT_FONT") {
            self.thumbnail.font_path = Some(PathBuf::from(font));
        }
        if let Some(raw) = lookup("REELWRIGHT_ENCODER_TIMEOUT_SECS") {
            self.encoder.timeout_secs =
                Some(parse_override("REELWRIGHT_ENCODER_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("REELWRIGHT_NARRATION_SOURCE") {
            self.narration.source = NarrationSource::parse(&raw).ok_or_else(|| {
                ReelError::config(format!("REELWRIGHT_NARRATION_SOURCE: unknown source {raw:?}"))
            })?;
        }
        if let Some(tag) = lookup("REELWRIGHT_AFFILIATE_TAG") {
            let tag = tag.trim().to_string();
            self.narration.affiliate_tag = (!tag.is_empty()).then_some(tag);
        }
        if let Some(level) = lookup("REELWRIGHT_LOG") {
            self.logging.level = level;
        }
        Ok(())
    }
}

/// Parse a numeric override value.
pub fn parse_override<T: std::str::FromStr>(key: &str, raw: &str) -> ReelResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ReelError::config(format!("{key}: cannot parse {raw:?}")))
}

/// Parse a boolean override value (`1/0`, `true/false`, `yes/no`, `on/off`).
pub fn parse_flag(key: &str, raw: &str) -> ReelResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ReelError::config(format!("{key}: expected a boolean, got {raw:?}"))),
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelwright").join("config.json")
}
