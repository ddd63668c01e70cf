//! Create a new Reelwright job directory.

use std::path::PathBuf;

use reelwright_model::{LoadedJob, ReelJob};

pub fn run(
    title: String,
    output: PathBuf,
    photos: Vec<String>,
    narration: String,
    duration: f64,
) -> anyhow::Result<()> {
    let job = ReelJob::new(&title, photos, narration, duration);
    let job_dir = output.join(job.slug());
    println!("Creating job '{}' at {}", title, job_dir.display());

    std::fs::create_dir_all(&job_dir)?;
    let loaded = LoadedJob::create(&job_dir, job)
        .map_err(|e| anyhow::anyhow!("Failed to create job: {e}"))?;

    println!("Job created successfully:");
    println!("  File: {}", loaded.file.display());
    println!("  Photos: {}", loaded.job.photos.len());
    println!(
        "  Narration: {} ({:.1}s)",
        loaded.job.narration.path, loaded.job.narration.duration_secs
    );
    println!(
        "  Output: {}x{} @ {}fps",
        loaded.job.output.width, loaded.job.output.height, loaded.job.output.fps
    );
    println!();
    println!("Next steps:");
    println!("  1. Put the narration audio next to job.json");
    println!("  2. Add photos, captions, music or a logo to job.json");
    println!("  3. reelwright validate {}", job_dir.display());

    Ok(())
}
