//! Caption cue type.

use serde::{Deserialize, Serialize};

/// A timed caption unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    /// Start time in seconds.
    pub start_secs: f64,
    /// End time in seconds.
    pub end_secs: f64,
    /// Caption text.
    pub text: String,
}

impl CaptionCue {
    pub fn new(start_secs: f64, end_secs: f64, text: impl Into<String>) -> Self {
        Self {
            start_secs,
            end_secs,
            text: text.into(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// `0 <= start < end`, finite times, and non-blank text.
    pub fn is_valid(&self) -> bool {
        self.start_secs.is_finite()
            && self.end_secs.is_finite()
            && self.start_secs >= 0.0
            && self.start_secs < self.end_secs
            && !self.text.trim().is_empty()
    }
}
