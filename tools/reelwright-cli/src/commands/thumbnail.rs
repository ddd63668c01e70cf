//! Draw a thumbnail from one photo.

use std::path::PathBuf;

use reelwright_common::AppConfig;
use reelwright_render::{render_thumbnail, ThumbnailSpec};

pub fn run(
    image: PathBuf,
    title: String,
    brand: Option<String>,
    output: PathBuf,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let spec = ThumbnailSpec { title, brand };
    let outcome = render_thumbnail(&image, &spec, &config.thumbnail, &output)?;
    if !outcome.text_drawn {
        println!("[WARN] No usable font found; set thumbnail.font_path or REELWRIGHT_FONT");
    }
    println!("Thumbnail written: {}", outcome.path.display());
    Ok(())
}
