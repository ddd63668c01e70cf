//! Check system capabilities.

use reelwright_common::{config_file_path, AppConfig};
use reelwright_render::{load_font, FfmpegBackend, RenderBackend};

pub async fn run(config: &AppConfig, write_config: bool) -> anyhow::Result<()> {
    println!("Reelwright System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if write_config {
        config.save()?;
        println!("[OK] Config written: {}", config_path.display());
    } else if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }
    println!("     Output dir: {}", config.output_dir.display());

    let backend = FfmpegBackend::new(config.encoder.clone());
    let encoder_ok = backend.is_available().await;
    if encoder_ok {
        println!("[OK] Encoder: {}", config.encoder.binary);
    } else {
        println!(
            "[FAIL] Encoder: '{}' not found or not runnable",
            config.encoder.binary
        );
    }

    if load_font(config.thumbnail.font_path.as_deref()).is_some() {
        println!("[OK] Thumbnail font available");
    } else {
        println!("[WARN] No thumbnail font found; thumbnails will have no text");
    }

    println!();
    if encoder_ok {
        println!("Reelwright is ready to render.");
    } else {
        println!("Install ffmpeg or set encoder.binary in the config file.");
    }

    Ok(())
}
