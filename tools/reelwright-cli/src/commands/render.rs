//! Render a job to video.

use std::io::Write;
use std::path::PathBuf;

use reelwright_assets::ReferenceFetcher;
use reelwright_common::AppConfig;
use reelwright_model::LoadedJob;
use reelwright_render::{run_pipeline, FfmpegBackend, ProgressCallback, RenderProgress, RunOptions};

pub async fn run(
    path: PathBuf,
    dry_run: bool,
    output: Option<PathBuf>,
    mut config: AppConfig,
) -> anyhow::Result<()> {
    println!("Rendering job at: {}", path.display());

    let mut loaded =
        LoadedJob::load(&path).map_err(|e| anyhow::anyhow!("Failed to load job: {e}"))?;
    loaded.job.style = loaded.job.style.clone().with_env_overrides()?;
    if let Some(dir) = output {
        config.output_dir = dir;
    }

    println!("  Title: {}", loaded.job.title);
    println!("  Output dir: {}", config.output_dir.display());

    let fetcher = ReferenceFetcher::new(&config.fetch)?;
    let backend = FfmpegBackend::new(config.encoder.clone());

    let progress_cb: ProgressCallback = Box::new(|p: RenderProgress| {
        print!(
            "\r  Progress: {:.1}% ({:.1}s encoded, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.out_time_secs,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
    });

    let options = RunOptions {
        dry_run,
        progress: Some(progress_cb),
        workspace_parent: None,
    };

    let report = match run_pipeline(&loaded, &config, &fetcher, &backend, options).await {
        Ok(report) => report,
        Err(e) => {
            let stage = e.stage().map(|s| s.as_str()).unwrap_or("unknown");
            tracing::debug!(stage, error = ?e, "Pipeline returned an error");
            return Err(anyhow::anyhow!("Render failed during {stage}: {}", e.root()));
        }
    };

    println!();
    for warning in &report.warnings {
        println!("  [WARN] {warning}");
    }
    println!("  Plan: {}", report.plan_report.display());
    match &report.video {
        Some(video) => println!("Render complete: {}", video.display()),
        None => println!("Dry run complete; nothing encoded."),
    }
    if let Some(thumbnail) = &report.thumbnail {
        println!("Thumbnail: {}", thumbnail.display());
    }

    Ok(())
}
