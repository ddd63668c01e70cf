//! Cue list normalization.

use reelwright_model::CaptionCue;

/// Reduce a raw cue list to its canonical form.
///
/// The result is sorted ascending by start, contains no exact duplicates,
/// and has no overlaps: a cue starting before the previous cue ends has its
/// start moved up to that end, and is dropped if nothing remains. Invalid
/// cues (blank text, non-finite or reversed times) are dropped first.
pub fn normalize_cues(cues: Vec<CaptionCue>) -> Vec<CaptionCue> {
    let mut cues: Vec<CaptionCue> = cues
        .into_iter()
        .map(|mut cue| {
            cue.text = cue.text.trim().to_string();
            cue
        })
        .filter(CaptionCue::is_valid)
        .collect();

    cues.sort_by(|a, b| {
        a.start_secs
            .total_cmp(&b.start_secs)
            .then(a.end_secs.total_cmp(&b.end_secs))
            .then_with(|| a.text.cmp(&b.text))
    });
    cues.dedup();

    let candidates = cues.len();
    let mut normalized: Vec<CaptionCue> = Vec::with_capacity(candidates);
    for mut cue in cues {
        if let Some(prev) = normalized.last() {
            if cue.start_secs < prev.end_secs {
                cue.start_secs = prev.end_secs;
            }
        }
        if cue.start_secs < cue.end_secs {
            normalized.push(cue);
        }
    }

    let dropped = candidates - normalized.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = normalized.len(), "Dropped overlapping cues");
    }
    normalized
}
