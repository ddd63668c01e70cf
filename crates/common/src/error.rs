//! Error types shared across Reelwright crates.

use std::fmt;
use std::path::PathBuf;

/// Pipeline stage a fatal error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Validate,
    Assets,
    Timeline,
    Captions,
    Compile,
    Encode,
    Thumbnail,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Validate => "validate",
            PipelineStage::Assets => "assets",
            PipelineStage::Timeline => "timeline",
            PipelineStage::Captions => "captions",
            PipelineStage::Compile => "compile",
            PipelineStage::Encode => "encode",
            PipelineStage::Thumbnail => "thumbnail",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for Reelwright operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelError {
    /// A single asset could not be fetched or decoded. Recoverable: the
    /// asset is skipped.
    #[error("Asset fetch error for {reference}: {message}")]
    AssetFetch { reference: String, message: String },

    #[error("Insufficient assets: {message}")]
    InsufficientAssets { message: String },

    /// The caption source is unusable. Recoverable: captions are disabled
    /// for the run.
    #[error("Caption source error: {message}")]
    CaptionSource { message: String },

    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Plan compilation error: {message}")]
    PlanCompilation { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Thumbnail error: {message}")]
    Thumbnail { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<ReelError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelError.
pub type ReelResult<T> = Result<T, ReelError>;

impl ReelError {
    pub fn asset_fetch(reference: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::AssetFetch {
            reference: reference.into(),
            message: msg.into(),
        }
    }

    pub fn insufficient_assets(msg: impl Into<String>) -> Self {
        Self::InsufficientAssets {
            message: msg.into(),
        }
    }

    pub fn caption_source(msg: impl Into<String>) -> Self {
        Self::CaptionSource {
            message: msg.into(),
        }
    }

    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }

    pub fn plan(msg: impl Into<String>) -> Self {
        Self::PlanCompilation {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn thumbnail(msg: impl Into<String>) -> Self {
        Self::Thumbnail {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Attach the pipeline stage to an error. Already-staged errors keep
    /// their original stage.
    pub fn in_stage(self, stage: PipelineStage) -> Self {
        match self {
            staged @ ReelError::Stage { .. } => staged,
            other => ReelError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage this error was raised in, if known.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            ReelError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The underlying error with any stage wrapper removed.
    pub fn root(&self) -> &ReelError {
        match self {
            ReelError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the pipeline can absorb this error and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.root(),
            ReelError::AssetFetch { .. } | ReelError::CaptionSource { .. }
        )
    }
}
