//! Duration resolution.
//!
//! The measured narration length decides the program length, clamped into
//! a range that reads well as a short vertical video, and is split evenly
//! across the available slides.

use reelwright_common::{ReelError, ReelResult};
use reelwright_model::{MediaAsset, Timeline};
use serde::{Deserialize, Serialize};

/// Shortest program length in seconds.
pub const MIN_TOTAL_SECS: f64 = 18.0;

/// Longest program length in seconds.
pub const MAX_TOTAL_SECS: f64 = 40.0;

/// Most slides a reel will show.
pub const MAX_SLIDES: usize = 5;

/// Program timing derived from a narration length and a slide count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDuration {
    pub total_secs: f64,
    pub per_slide_secs: f64,
    pub slide_count: usize,
}

/// Clamp `narration_secs` into `[18, 40]` and split it across
/// `min(slide_count, 5)` slides.
///
/// A measured length that is not positive and finite is rejected, as is a
/// slide count of zero.
pub fn resolve_duration(narration_secs: f64, slide_count: usize) -> ReelResult<ResolvedDuration> {
    if slide_count == 0 {
        return Err(ReelError::timeline(
            "cannot build a timeline with zero slides",
        ));
    }
    if !narration_secs.is_finite() || narration_secs <= 0.0 {
        return Err(ReelError::timeline(format!(
            "narration duration must be a positive number of seconds, got {narration_secs}"
        )));
    }

    let slide_count = slide_count.min(MAX_SLIDES);
    let total_secs = narration_secs.clamp(MIN_TOTAL_SECS, MAX_TOTAL_SECS);
    let per_slide_secs = total_secs / slide_count as f64;

    if total_secs != narration_secs {
        tracing::debug!(
            narration_secs,
            total_secs,
            "Narration length clamped to presentable range"
        );
    }

    Ok(ResolvedDuration {
        total_secs,
        per_slide_secs,
        slide_count,
    })
}

/// Lay out the first (at most five) assets as a contiguous timeline.
pub fn build_timeline(assets: &[MediaAsset], narration_secs: f64) -> ReelResult<Timeline> {
    let resolved = resolve_duration(narration_secs, assets.len())?;
    let kept = assets[..resolved.slide_count].to_vec();
    let timeline = Timeline::contiguous(kept, resolved.per_slide_secs, resolved.total_secs);

    timeline.check_invariants().map_err(ReelError::timeline)?;

    tracing::info!(
        slides = timeline.len(),
        total_secs = resolved.total_secs,
        per_slide_secs = resolved.per_slide_secs,
        "Timeline resolved"
    );
    Ok(timeline)
}
