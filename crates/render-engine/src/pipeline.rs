//! End-to-end reel pipeline.
//!
//! Validate the job, normalize the photos, lay out the timeline, load
//! captions, compile the plan, encode, and draw the thumbnail. Temporary
//! files live in one [`RunWorkspace`] that is removed on every exit path.

use std::fmt;
use std::path::PathBuf;

use reelwright_assets::{normalize_assets, AssetFetcher, RunWorkspace};
use reelwright_captions::{load_caption_source, write_srt};
use reelwright_common::{AppConfig, PipelineStage, ReelError, ReelResult};
use reelwright_model::LoadedJob;
use reelwright_processing::{build_timeline, MAX_SLIDES};

use crate::compiler::{compile_plan, CaptionTrack, CompileRequest, PlanWarning, RenderPlan};
use crate::export::{plan_report_path, write_plan_report, ProgressCallback, RenderBackend};
use crate::thumbnail::{render_thumbnail, ThumbnailSpec};

/// Per-run switches that are not part of the configuration.
#[derive(Default)]
pub struct RunOptions {
    /// Compile and write the plan report, but do not encode or draw the
    /// thumbnail.
    pub dry_run: bool,

    /// Encoder progress callback.
    pub progress: Option<ProgressCallback>,

    /// Directory for the run workspace. The system temp dir when unset.
    pub workspace_parent: Option<PathBuf>,
}

/// Something that went wrong without stopping the run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunWarning {
    AssetSkipped { reference: String, reason: String },
    CaptionsDisabled { reason: String },
    OptionalInputMissing { role: &'static str, path: PathBuf },
    ThumbnailTextSkipped,
    Plan(PlanWarning),
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::AssetSkipped { reference, reason } => {
                write!(f, "photo skipped ({reference}): {reason}")
            }
            RunWarning::CaptionsDisabled { reason } => write!(f, "captions disabled: {reason}"),
            RunWarning::OptionalInputMissing { role, path } => {
                write!(f, "{role} not found, continuing without it: {}", path.display())
            }
            RunWarning::ThumbnailTextSkipped => {
                f.write_str("no usable font; thumbnail drawn without text")
            }
            RunWarning::Plan(warning) => warning.fmt(f),
        }
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Encoded video; `None` on a dry run.
    pub video: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
    pub plan_report: PathBuf,
    pub plan: RenderPlan,
    pub warnings: Vec<RunWarning>,
}

trait StageExt<T> {
    fn at_stage(self, stage: PipelineStage) -> ReelResult<T>;
}

impl<T> StageExt<T> for ReelResult<T> {
    fn at_stage(self, stage: PipelineStage) -> ReelResult<T> {
        self.map_err(|e| e.in_stage(stage))
    }
}

/// Run one job through every stage.
///
/// Fatal errors come back wrapped with the stage they happened in; no plan
/// is returned for a failed run.
pub async fn run_pipeline<F, B>(
    loaded: &LoadedJob,
    config: &AppConfig,
    fetcher: &F,
    backend: &B,
    options: RunOptions,
) -> ReelResult<RunReport>
where
    F: AssetFetcher,
    B: RenderBackend,
{
    let job = &loaded.job;
    let mut warnings = Vec::new();
    tracing::info!(title = job.title.as_str(), photos = job.photos.len(), "Starting reel run");

    // Validate
    job.validate()
        .map_err(|e| ReelError::config(e.to_string()))
        .at_stage(PipelineStage::Validate)?;
    let narration = loaded.narration_track();
    if !narration.path.exists() {
        return Err(ReelError::insufficient_assets(format!(
            "narration track not found: {}",
            narration.path.display()
        )))
        .at_stage(PipelineStage::Validate);
    }
    let music = optional_input("music", loaded.music_path(), &mut warnings);
    let logo = optional_input("logo", loaded.logo_path(), &mut warnings);

    let workspace = match &options.workspace_parent {
        Some(parent) => RunWorkspace::new_in(parent),
        None => RunWorkspace::new(),
    }
    .at_stage(PipelineStage::Assets)?;

    // Assets
    let references: Vec<String> = job
        .photos
        .iter()
        .map(|p| loaded.resolve_reference(p))
        .collect();
    let assets = normalize_assets(fetcher, &references, &config.fetch, &workspace, MAX_SLIDES)
        .await
        .at_stage(PipelineStage::Assets)?;
    warnings.extend(assets.skipped.iter().map(|s| RunWarning::AssetSkipped {
        reference: s.reference.clone(),
        reason: s.reason.clone(),
    }));

    // Timeline
    let timeline =
        build_timeline(&assets.assets, narration.duration_secs).at_stage(PipelineStage::Timeline)?;

    // Captions
    let captions = match (&job.captions, job.style.captions.enabled) {
        (Some(source), true) => {
            let path = loaded.resolve(&source.path);
            let srt = workspace.file("captions.srt");
            let loaded_cues = load_caption_source(&path, source.format.as_deref())
                .and_then(|cues| write_srt(&cues, &srt).map(|()| cues.len()));
            match loaded_cues {
                Ok(cue_count) => Some(CaptionTrack {
                    path: srt,
                    cue_count,
                }),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(error = %e, "Captions disabled for this run");
                    warnings.push(RunWarning::CaptionsDisabled {
                        reason: e.to_string(),
                    });
                    None
                }
                Err(e) => return Err(e).at_stage(PipelineStage::Captions),
            }
        }
        _ => None,
    };

    // Compile
    let slug = job.slug();
    let video_path = config.output_dir.join(format!("{slug}.mp4"));
    let plan = compile_plan(&CompileRequest {
        timeline: &timeline,
        narration: &narration,
        captions: captions.as_ref(),
        music: music.as_deref(),
        logo: logo.as_deref(),
        style: &job.style,
        output: job.output,
        output_path: &video_path,
    })
    .at_stage(PipelineStage::Compile)?;
    warnings.extend(plan.warnings.iter().cloned().map(RunWarning::Plan));

    let plan_report = plan_report_path(&video_path);
    write_plan_report(&plan, &plan_report).at_stage(PipelineStage::Compile)?;

    if options.dry_run {
        tracing::info!(plan = %plan_report.display(), "Dry run; skipping encode");
        close_workspace(workspace);
        return Ok(RunReport {
            video: None,
            thumbnail: None,
            plan_report,
            plan,
            warnings,
        });
    }

    // Encode
    if !backend.is_available().await {
        return Err(ReelError::unsupported(format!(
            "render backend '{}' is not available",
            backend.name()
        )))
        .at_stage(PipelineStage::Encode);
    }
    tracing::info!(backend = backend.name(), "Using render backend");
    backend
        .render(&plan, options.progress)
        .await
        .at_stage(PipelineStage::Encode)?;

    // Thumbnail
    let thumbnail = if config.thumbnail.enabled {
        let hero = timeline.slides[0].asset.path.clone();
        let out = config.output_dir.join(format!("{slug}-thumb.jpg"));
        let spec = ThumbnailSpec {
            title: job.title.clone(),
            brand: job.brand.clone(),
        };
        let thumb_config = config.thumbnail.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            render_thumbnail(&hero, &spec, &thumb_config, &out)
        })
        .await
        .map_err(|e| ReelError::Other(e.into()))
        .and_then(|result| result)
        .at_stage(PipelineStage::Thumbnail)?;
        if !outcome.text_drawn {
            warnings.push(RunWarning::ThumbnailTextSkipped);
        }
        Some(outcome.path)
    } else {
        None
    };

    close_workspace(workspace);
    tracing::info!(
        video = %video_path.display(),
        warnings = warnings.len(),
        "Reel run finished"
    );

    Ok(RunReport {
        video: Some(video_path),
        thumbnail,
        plan_report,
        plan,
        warnings,
    })
}

fn optional_input(
    role: &'static str,
    path: Option<PathBuf>,
    warnings: &mut Vec<RunWarning>,
) -> Option<PathBuf> {
    let path = path?;
    if path.exists() {
        Some(path)
    } else {
        tracing::warn!(role, path = %path.display(), "Optional input missing");
        warnings.push(RunWarning::OptionalInputMissing { role, path });
        None
    }
}

fn close_workspace(workspace: RunWorkspace) {
    if let Err(e) = workspace.close() {
        tracing::warn!(error = %e, "Failed to remove run workspace");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use reelwright_model::ReelJob;

    struct RecordingBackend {
        plans: Mutex<Vec<String>>,
    }

    impl RenderBackend for RecordingBackend {
        async fn render(&self, plan: &RenderPlan, _progress: Option<ProgressCallback>) -> ReelResult<()> {
            self.plans.lock().unwrap().push(plan.filter_complex());
            Ok(())
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct NoFetch;

    impl AssetFetcher for NoFetch {
        async fn fetch(&self, reference: &str) -> ReelResult<Vec<u8>> {
            Err(ReelError::asset_fetch(reference, "offline"))
        }
    }

    fn job_dir() -> (tempfile::TempDir, LoadedJob) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("voice.mp3"), b"mp3").unwrap();
        let job = ReelJob::new("Desk Fan", vec!["a.jpg".into()], "voice.mp3", 25.0);
        let loaded = LoadedJob::create(dir.path(), job).unwrap();
        (dir, loaded)
    }

    #[tokio::test]
    async fn test_zero_assets_fails_in_asset_stage() {
        let (dir, loaded) = job_dir();
        let config = AppConfig {
            output_dir: dir.path().join("out"),
            ..AppConfig::default()
        };
        let backend = RecordingBackend {
            plans: Mutex::new(vec![]),
        };
        let err = run_pipeline(&loaded, &config, &NoFetch, &backend, RunOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Assets));
        assert!(matches!(err.root(), ReelError::InsufficientAssets { .. }));
        assert!(backend.plans.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_narration_is_fatal() {
        let (dir, mut loaded) = job_dir();
        loaded.job.narration.path = "gone.mp3".into();
        let config = AppConfig {
            output_dir: dir.path().join("out"),
            ..AppConfig::default()
        };
        let backend = RecordingBackend {
            plans: Mutex::new(vec![]),
        };
        let err = run_pipeline(&loaded, &config, &NoFetch, &backend, RunOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Validate));
        assert!(matches!(err.root(), ReelError::InsufficientAssets { .. }));
    }

    #[tokio::test]
    async fn test_zero_narration_length_is_timeline_error() {
        let (dir, mut loaded) = job_dir();
        loaded.job.narration.duration_secs = 0.0;
        image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30]))
            .save(dir.path().join("a.jpg"))
            .unwrap();
        let config = AppConfig {
            output_dir: dir.path().join("out"),
            ..AppConfig::default()
        };
        let backend = RecordingBackend {
            plans: Mutex::new(vec![]),
        };
        let fetcher = reelwright_assets::LocalFetcher;
        let err = run_pipeline(&loaded, &config, &fetcher, &backend, RunOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::Timeline));
        assert!(matches!(err.root(), ReelError::Timeline { .. }));
        assert!(backend.plans.lock().unwrap().is_empty());
    }

    #[test]
    fn test_warning_display() {
        let warning = RunWarning::Plan(PlanWarning::CaptionsUnavailable {
            reason: "no caption source supplied".into(),
        });
        assert_eq!(warning.to_string(), "captions omitted: no caption source supplied");
        let missing = RunWarning::OptionalInputMissing {
            role: "music",
            path: PathBuf::from("bed.mp3"),
        };
        assert!(missing.to_string().starts_with("music not found"));
    }
}
