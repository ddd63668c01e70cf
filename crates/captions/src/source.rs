//! Caption source loading.
//!
//! Every failure here is a `CaptionSource` error, which the pipeline treats
//! as recoverable: captions are turned off for the run.

use std::path::Path;

use reelwright_common::{ReelError, ReelResult};
use reelwright_model::CaptionCue;

use crate::blocks::cues_from_blocks;
use crate::normalize::normalize_cues;
use crate::ticks::{cues_from_ticks, parse_tick_events};

/// Shape of a caption source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    /// JSON array of tick events.
    Ticks,
    Vtt,
    Srt,
}

impl CaptionFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ticks" | "json" | "tick" => Some(Self::Ticks),
            "vtt" | "webvtt" => Some(Self::Vtt),
            "srt" => Some(Self::Srt),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::parse)
    }

    /// Guess from content: JSON arrays are tick events, anything with a
    /// time-range arrow is block text.
    pub fn sniff(text: &str) -> Option<Self> {
        let trimmed = text.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with('[') {
            Some(Self::Ticks)
        } else if trimmed.starts_with("WEBVTT") {
            Some(Self::Vtt)
        } else if trimmed.contains("-->") {
            Some(Self::Srt)
        } else {
            None
        }
    }
}

/// Parse caption text of a known format into a normalized cue list.
pub fn parse_caption_text(text: &str, format: CaptionFormat) -> ReelResult<Vec<CaptionCue>> {
    let raw = match format {
        CaptionFormat::Ticks => cues_from_ticks(&parse_tick_events(text)?),
        CaptionFormat::Vtt | CaptionFormat::Srt => cues_from_blocks(text),
    };
    let cues = normalize_cues(raw);
    if cues.is_empty() {
        return Err(ReelError::caption_source("source contains no usable cues"));
    }
    Ok(cues)
}

/// Load and normalize a caption source file.
///
/// `format` overrides detection; otherwise the extension decides, and the
/// content is sniffed as a last resort.
pub fn load_caption_source(path: &Path, format: Option<&str>) -> ReelResult<Vec<CaptionCue>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ReelError::caption_source(format!("cannot read {}: {e}", path.display()))
    })?;

    let format = match format {
        Some(name) => CaptionFormat::parse(name).ok_or_else(|| {
            ReelError::caption_source(format!("unknown caption format {name:?}"))
        })?,
        None => CaptionFormat::from_path(path)
            .or_else(|| CaptionFormat::sniff(&text))
            .ok_or_else(|| {
                ReelError::caption_source(format!(
                    "cannot tell the caption format of {}",
                    path.display()
                ))
            })?,
    };

    let cues = parse_caption_text(&text, format)?;
    tracing::info!(
        path = %path.display(),
        format = ?format,
        cues = cues.len(),
        "Caption source loaded"
    );
    Ok(cues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            CaptionFormat::from_path(Path::new("voice.VTT")),
            Some(CaptionFormat::Vtt)
        );
        assert_eq!(
            CaptionFormat::from_path(Path::new("events.json")),
            Some(CaptionFormat::Ticks)
        );
        assert_eq!(CaptionFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(CaptionFormat::sniff("  [ {} ]"), Some(CaptionFormat::Ticks));
        assert_eq!(
            CaptionFormat::sniff("1\n00:00:01,000 --> 00:00:02,000\nx"),
            Some(CaptionFormat::Srt)
        );
    }

    #[test]
    fn test_both_shapes_yield_same_cues() {
        let ticks = r#"[
            {"offset_ticks": 15000000, "duration_ticks": 10000000, "text": "Second"},
            {"offset_ticks": 0, "duration_ticks": 15000000, "text": "First"}
        ]"#;
        let vtt = "WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nFirst\n\n\
                   00:00:01.500 --> 00:00:02.500\nSecond\n";
        let from_ticks = parse_caption_text(ticks, CaptionFormat::Ticks).unwrap();
        let from_vtt = parse_caption_text(vtt, CaptionFormat::Vtt).unwrap();
        assert_eq!(from_ticks, from_vtt);
        assert_eq!(from_ticks[0].text, "First");
    }

    #[test]
    fn test_empty_source_is_caption_error() {
        let err = parse_caption_text("WEBVTT\n\n", CaptionFormat::Vtt).unwrap_err();
        assert!(matches!(err, ReelError::CaptionSource { .. }));
    }

    #[test]
    fn test_load_missing_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_caption_source(&dir.path().join("missing.vtt"), None)
            .unwrap_err()
            .is_recoverable());

        let path = dir.path().join("captions.txt");
        std::fs::write(&path, "just words").unwrap();
        assert!(load_caption_source(&path, None).is_err());
        assert!(load_caption_source(&path, Some("klingon")).is_err());
    }
}
