//! Slide timeline.
//!
//! A timeline is an ordered list of slides whose durations sum to the
//! program length and whose start times are contiguous.

use serde::{Deserialize, Serialize};

use crate::asset::MediaAsset;

/// Tolerance used when checking timeline sums and contiguity.
pub const TIMELINE_EPSILON: f64 = 1e-6;

/// One image and its slot in the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub asset: MediaAsset,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl Slide {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Ordered, gap-free sequence of slides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub slides: Vec<Slide>,
    pub total_secs: f64,
}

impl Timeline {
    /// Lay assets out back to back, each lasting `per_slide_secs`.
    ///
    /// Every start is the previous slide's end, so contiguity holds exactly
    /// rather than within a tolerance.
    pub fn contiguous(assets: Vec<MediaAsset>, per_slide_secs: f64, total_secs: f64) -> Self {
        let mut slides: Vec<Slide> = Vec::with_capacity(assets.len());
        for asset in assets {
            let start_secs = slides.last().map(Slide::end_secs).unwrap_or(0.0);
            slides.push(Slide {
                asset,
                start_secs,
                duration_secs: per_slide_secs,
            });
        }
        Self { slides, total_secs }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Duration shared by every slide (the first slide's duration).
    pub fn per_slide_secs(&self) -> f64 {
        self.slides
            .first()
            .map(|s| s.duration_secs)
            .unwrap_or(0.0)
    }

    /// Check the timeline invariants, returning a description of the first
    /// violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.slides.is_empty() {
            return Err("timeline has no slides".to_string());
        }
        if let Some(first) = self.slides.first() {
            if first.start_secs.abs() > TIMELINE_EPSILON {
                return Err(format!("first slide starts at {}", first.start_secs));
            }
        }
        for pair in self.slides.windows(2) {
            let gap = pair[1].start_secs - pair[0].end_secs();
            if gap.abs() > TIMELINE_EPSILON {
                return Err(format!(
                    "slide {} ends at {} but slide {} starts at {}",
                    pair[0].asset.ordinal,
                    pair[0].end_secs(),
                    pair[1].asset.ordinal,
                    pair[1].start_secs
                ));
            }
        }
        let sum: f64 = self.slides.iter().map(|s| s.duration_secs).sum();
        if (sum - self.total_secs).abs() > TIMELINE_EPSILON {
            return Err(format!(
                "slide durations sum to {sum} but total is {}",
                self.total_secs
            ));
        }
        Ok(())
    }
}
