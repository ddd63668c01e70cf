//! Media asset references.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A normalized still image on local disk.
///
/// Owned by the run that created it and immutable once normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Local path of the normalized file.
    pub path: PathBuf,

    /// Position of this asset in the surviving image list (0-based).
    pub ordinal: usize,

    /// The reference the asset was fetched from (URL or path).
    pub source: String,
}

impl MediaAsset {
    pub fn new(path: impl Into<PathBuf>, ordinal: usize, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ordinal,
            source: source.into(),
        }
    }
}

/// The narration audio and its measured duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationTrack {
    pub path: PathBuf,

    /// Measured duration in seconds (a fact about the file, not a setting).
    pub duration_secs: f64,
}

impl NarrationTrack {
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64) -> Self {
        Self {
            path: path.into(),
            duration_secs,
        }
    }
}
