//! Tick-based caption events.
//!
//! Speech synthesizers report sentence boundaries as an offset and a
//! duration in 100 ns ticks. A source file is a JSON array of such events.

use reelwright_common::{ReelError, ReelResult};
use reelwright_model::CaptionCue;
use serde::{Deserialize, Serialize};

/// Ticks per second (100 ns resolution).
pub const TICKS_PER_SECOND: f64 = 10_000_000.0;

/// One sentence-boundary event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvent {
    #[serde(alias = "offset", alias = "Offset")]
    pub offset_ticks: u64,

    #[serde(alias = "duration", alias = "Duration", default)]
    pub duration_ticks: u64,

    #[serde(alias = "Text")]
    pub text: String,
}

impl TickEvent {
    pub fn new(offset_ticks: u64, duration_ticks: u64, text: impl Into<String>) -> Self {
        Self {
            offset_ticks,
            duration_ticks,
            text: text.into(),
        }
    }

    /// Convert to a cue. A zero duration is widened to one tick so the cue
    /// is never empty.
    pub fn to_cue(&self) -> CaptionCue {
        let start = self.offset_ticks as f64 / TICKS_PER_SECOND;
        let end_ticks = self.offset_ticks.saturating_add(self.duration_ticks.max(1));
        CaptionCue::new(start, end_ticks as f64 / TICKS_PER_SECOND, self.text.trim())
    }
}

/// Parse a JSON array of tick events.
pub fn parse_tick_events(json: &str) -> ReelResult<Vec<TickEvent>> {
    serde_json::from_str(json)
        .map_err(|e| ReelError::caption_source(format!("invalid tick-event JSON: {e}")))
}

/// Convert tick events to cues, dropping events with blank text. The
/// result is in event order; run it through `normalize_cues` for ordering.
pub fn cues_from_ticks(events: &[TickEvent]) -> Vec<CaptionCue> {
    events
        .iter()
        .filter(|e| !e.text.trim().is_empty())
        .map(TickEvent::to_cue)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_conversion() {
        let cue = TickEvent::new(10_000_000, 15_000_000, "Hello").to_cue();
        assert_eq!(cue, CaptionCue::new(1.0, 2.5, "Hello"));
    }

    #[test]
    fn test_zero_duration_widened() {
        let cue = TickEvent::new(20_000_000, 0, "Hi").to_cue();
        assert_eq!(cue.start_secs, 2.0);
        assert!(cue.end_secs > cue.start_secs);
    }

    #[test]
    fn test_blank_text_dropped() {
        let cues = cues_from_ticks(&[
            TickEvent::new(0, 5_000_000, "  "),
            TickEvent::new(5_000_000, 5_000_000, "kept"),
        ]);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "kept");
    }

    #[test]
    fn test_parse_accepts_field_aliases() {
        let events = parse_tick_events(
            r#"[
                {"offset": 0, "duration": 10000000, "text": "One"},
                {"Offset": 10000000, "Duration": 5000000, "Text": "Two"}
            ]"#,
        )
        .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].offset_ticks, 10_000_000);
        assert_eq!(events[1].text, "Two");
    }

    #[test]
    fn test_parse_error_is_caption_source() {
        let err = parse_tick_events("{not json").unwrap_err();
        assert!(err.is_recoverable());
    }
}
