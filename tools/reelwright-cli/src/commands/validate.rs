//! Validate a Reelwright job file.

use std::path::PathBuf;

use reelwright_model::LoadedJob;
use reelwright_processing::resolve_duration;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating job at: {}", path.display());

    let loaded = LoadedJob::load(&path).map_err(|e| anyhow::anyhow!("Failed to load job: {e}"))?;
    let job = &loaded.job;

    println!("  Title: {}", job.title);
    println!("  Version: {}", job.version);
    println!("  Photos: {}", job.photos.len());
    println!("  Narration: {:.1}s", job.narration.duration_secs);
    println!(
        "  Captions: {}",
        match (&job.captions, job.style.captions.enabled) {
            (Some(c), true) => format!("{} (burned in)", c.path),
            (Some(c), false) => format!("{} (disabled in style)", c.path),
            (None, true) => "enabled but no source given".to_string(),
            (None, false) => "none".to_string(),
        }
    );
    println!("  Music: {}", job.music.as_deref().unwrap_or("none"));
    println!("  Logo: {}", job.logo.as_deref().unwrap_or("none"));

    let mut issues = Vec::new();
    if let Err(e) = job.validate() {
        issues.push(e.to_string());
    }
    match resolve_duration(job.narration.duration_secs, job.photos.len().max(1)) {
        Ok(timing) => println!(
            "  Reel length: {:.1}s ({} slide(s) at {:.2}s)",
            timing.total_secs, timing.slide_count, timing.per_slide_secs
        ),
        Err(e) => issues.push(e.to_string()),
    }
    issues.extend(loaded.validate_sources());

    if issues.is_empty() {
        println!("  Sources: All present");
        println!("\nJob is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!("\n{} issue(s) found. The render may fail or skip inputs.", issues.len());
    }

    Ok(())
}
