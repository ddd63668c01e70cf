//! Job file types.
//!
//! A job (`job.json`) describes one reel: the photos to show, the narration
//! track and its measured length, optional captions, music and logo, the
//! style options, and the output format. Relative paths resolve against the
//! directory holding the job file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::NarrationTrack;
use crate::style::StyleConfig;

/// Default job file name inside a job directory.
pub const JOB_FILE_NAME: &str = "job.json";

/// Top-level job file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReelJob {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Product title shown on the thumbnail and used for the output name.
    pub title: String,

    /// Optional brand name for the thumbnail badge.
    #[serde(default)]
    pub brand: Option<String>,

    /// Photo references in display order (URLs or paths).
    pub photos: Vec<String>,

    pub narration: NarrationRef,

    #[serde(default)]
    pub captions: Option<CaptionSourceRef>,

    /// Background music path.
    #[serde(default)]
    pub music: Option<String>,

    /// Logo image path.
    #[serde(default)]
    pub logo: Option<String>,

    #[serde(default)]
    pub style: StyleConfig,

    #[serde(default)]
    pub output: OutputSpec,

    /// Product details used to build the narration script.
    #[serde(default)]
    pub product: Option<ProductInfo>,

    /// Creation timestamp (RFC 3339).
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Narration audio reference and its measured duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationRef {
    pub path: String,
    pub duration_secs: f64,
}

/// Caption source reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSourceRef {
    pub path: String,

    /// Explicit format (`ticks`, `vtt`, `srt`); detected from the extension
    /// when absent.
    #[serde(default)]
    pub format: Option<String>,
}

/// Output video format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
        }
    }
}

/// Product details consumed by the narration script builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInfo {
    pub asin: Option<String>,
    pub title: String,
    pub url: Option<String>,
    pub reviews: Vec<String>,
    pub features: Vec<String>,
}

impl ReelJob {
    /// Create a job with defaults for everything but the required inputs.
    pub fn new(
        title: impl Into<String>,
        photos: Vec<String>,
        narration_path: impl Into<String>,
        narration_secs: f64,
    ) -> Self {
        Self {
            version: default_version(),
            title: title.into(),
            brand: None,
            photos,
            narration: NarrationRef {
                path: narration_path.into(),
                duration_secs: narration_secs,
            },
            captions: None,
            music: None,
            logo: None,
            style: StyleConfig::default(),
            output: OutputSpec::default(),
            product: None,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// File-name friendly form of the title: lowercase ASCII alphanumerics
    /// separated by single dashes.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.title.len());
        for ch in self.title.chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            slug.pop();
        }
        if slug.is_empty() {
            "reel".to_string()
        } else {
            slug
        }
    }

    /// Check field values that do not depend on the filesystem.
    ///
    /// The narration length is left to the duration resolver, which owns
    /// the rules for it.
    pub fn validate(&self) -> Result<(), JobError> {
        let mut problems = vec![];
        if self.title.trim().is_empty() {
            problems.push("title is empty".to_string());
        }
        if self.photos.is_empty() {
            problems.push("no photos listed".to_string());
        }
        if self.output.width == 0 || self.output.height == 0 || self.output.fps == 0 {
            problems.push("output width, height and fps must be positive".to_string());
        }
        problems.extend(self.style.validate());

        if problems.is_empty() {
            Ok(())
        } else {
            Err(JobError::ValidationError {
                message: problems.join("; "),
            })
        }
    }
}

/// Whether a photo reference points at a remote resource.
pub fn is_remote_reference(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// A job file together with the directory it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedJob {
    /// Directory relative paths resolve against.
    pub root: PathBuf,

    /// Path of the job file itself.
    pub file: PathBuf,

    pub job: ReelJob,
}

impl LoadedJob {
    /// Load a job from a file, or from `job.json` inside a directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let path = path.as_ref();
        let file = if path.is_dir() {
            path.join(JOB_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let json = std::fs::read_to_string(&file).map_err(|e| JobError::IoError {
            path: file.clone(),
            source: e,
        })?;
        let job: ReelJob = serde_json::from_str(&json).map_err(|e| JobError::ParseError {
            path: file.clone(),
            source: e,
        })?;

        let root = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self { root, file, job })
    }

    /// Write the job back to its file, creating parent directories.
    pub fn save(&self) -> Result<(), JobError> {
        std::fs::create_dir_all(&self.root).map_err(|e| JobError::IoError {
            path: self.root.clone(),
            source: e,
        })?;
        let json = serde_json::to_string_pretty(&self.job).map_err(|e| JobError::ParseError {
            path: self.file.clone(),
            source: e,
        })?;
        std::fs::write(&self.file, json).map_err(|e| JobError::IoError {
            path: self.file.clone(),
            source: e,
        })
    }

    /// Create a job file at `root/job.json`.
    pub fn create(root: impl AsRef<Path>, job: ReelJob) -> Result<Self, JobError> {
        let root = root.as_ref().to_path_buf();
        let loaded = Self {
            file: root.join(JOB_FILE_NAME),
            root,
            job,
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Resolve a job-relative path. Absolute paths are returned unchanged.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let candidate = Path::new(relative);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    /// Resolve a photo reference: URLs stay as they are, paths are resolved
    /// against the job directory.
    pub fn resolve_reference(&self, reference: &str) -> String {
        if is_remote_reference(reference) {
            reference.to_string()
        } else {
            self.resolve(reference).to_string_lossy().into_owned()
        }
    }

    pub fn narration_track(&self) -> NarrationTrack {
        NarrationTrack::new(
            self.resolve(&self.job.narration.path),
            self.job.narration.duration_secs,
        )
    }

    pub fn music_path(&self) -> Option<PathBuf> {
        self.job.music.as_deref().map(|p| self.resolve(p))
    }

    pub fn logo_path(&self) -> Option<PathBuf> {
        self.job.logo.as_deref().map(|p| self.resolve(p))
    }

    /// Validate that all referenced local files exist.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        let mut check = |relative: &str, label: &str| {
            if !self.resolve(relative).exists() {
                errors.push(format!("{label} missing: {relative}"));
            }
        };

        check(&self.job.narration.path, "Narration");
        if let Some(captions) = &self.job.captions {
            check(&captions.path, "Caption source");
        }
        if let Some(music) = &self.job.music {
            check(music, "Music");
        }
        if let Some(logo) = &self.job.logo {
            check(logo, "Logo");
        }
        for photo in self.job.photos.iter().filter(|p| !is_remote_reference(p)) {
            check(photo, "Photo");
        }

        errors
    }
}

/// Errors that can occur when working with job files.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid job: {message}")]
    ValidationError { message: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidOverride { key: String, value: String },
}

impl JobError {
    pub fn invalid_override(key: &str, value: &str) -> Self {
        Self::InvalidOverride {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> ReelJob {
        ReelJob::new(
            "Ultra Quiet Desk Fan (2-Pack)",
            vec![
                "https://m.media-amazon.com/images/I/71x._AC_SL500_.jpg".to_string(),
                "photos/side.png".to_string(),
            ],
            "voice.mp3",
            24.7,
        )
    }

    #[test]
    fn test_slug() {
        assert_eq!(sample_job().slug(), "ultra-quiet-desk-fan-2-pack");
        let mut job = sample_job();
        job.title = "!!!".to_string();
        assert_eq!(job.slug(), "reel");
    }

    #[test]
    fn test_minimal_job_json_uses_defaults() {
        let job: ReelJob = serde_json::from_str(
            r#"{
                "title": "Fan",
                "photos": ["a.jpg"],
                "narration": { "path": "voice.mp3", "duration_secs": 20.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(job.version, "1.0");
        assert_eq!(job.output, OutputSpec::default());
        assert!(job.music.is_none());
        assert!(!job.style.captions.enabled);
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut job = sample_job();
        job.photos.clear();
        job.output.fps = 0;
        let err = job.validate().unwrap_err().to_string();
        assert!(err.contains("no photos"));
        assert!(err.contains("fps"));
    }

    #[test]
    fn test_create_load_and_validate_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = sample_job();
        job.music = Some("bed.mp3".to_string());
        let created = LoadedJob::create(dir.path(), job).unwrap();

        let loaded = LoadedJob::load(dir.path()).unwrap();
        assert_eq!(loaded.job.title, created.job.title);
        assert_eq!(loaded.root, dir.path());

        std::fs::write(dir.path().join("voice.mp3"), b"id3").unwrap();
        let errors = loaded.validate_sources();
        assert!(errors.iter().any(|e| e.contains("Music missing")));
        assert!(errors.iter().any(|e| e.contains("Photo missing: photos/side.png")));
        assert!(!errors.iter().any(|e| e.contains("Narration")));
        assert!(!errors.iter().any(|e| e.contains("https://")));
    }

    #[test]
    fn test_resolve_reference() {
        let loaded = LoadedJob {
            root: PathBuf::from("/jobs/fan"),
            file: PathBuf::from("/jobs/fan/job.json"),
            job: sample_job(),
        };
        assert_eq!(
            loaded.resolve_reference("https://example.com/a.jpg"),
            "https://example.com/a.jpg"
        );
        assert_eq!(
            loaded.resolve_reference("photos/side.png"),
            "/jobs/fan/photos/side.png"
        );
        assert_eq!(loaded.resolve("/abs/voice.mp3"), PathBuf::from("/abs/voice.mp3"));
    }
}
