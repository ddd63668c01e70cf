//! Print the narration script for a job.

use std::path::PathBuf;

use reelwright_common::{AppConfig, NarrationSource};
use reelwright_model::LoadedJob;
use reelwright_processing::{build_script, script::product_link};

pub fn run(path: PathBuf, source: Option<String>, config: &AppConfig) -> anyhow::Result<()> {
    let loaded = LoadedJob::load(&path).map_err(|e| anyhow::anyhow!("Failed to load job: {e}"))?;
    let product = loaded
        .job
        .product
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Job has no product section to narrate"))?;

    let mut narration = config.narration.clone();
    if let Some(raw) = source {
        narration.source = NarrationSource::parse(&raw)
            .ok_or_else(|| anyhow::anyhow!("Unknown narration source: {raw}"))?;
    }

    let script = build_script(product, &narration);
    println!("Tagline: {}", script.tagline);
    if let Some(link) = product_link(product, narration.affiliate_tag.as_deref()) {
        println!("Link: {link}");
    }
    println!();
    println!("{}", script.body);
    Ok(())
}
