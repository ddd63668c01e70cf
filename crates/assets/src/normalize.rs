//! Asset normalization.
//!
//! Each photo reference is fetched (trying the upscaled rendition first),
//! decoded, turned upright, flattened to 8-bit RGB and written as a JPEG
//! into the run workspace. Fetches run concurrently; the result keeps the
//! input order.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use reelwright_common::{FetchConfig, ReelError, ReelResult};
use reelwright_model::MediaAsset;

use crate::fetch::AssetFetcher;
use crate::rewrite::candidate_references;
use crate::workspace::RunWorkspace;

/// JPEG quality of normalized slides.
pub const SLIDE_JPEG_QUALITY: u8 = 95;

/// A photo that could not be used, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAsset {
    pub reference: String,
    pub reason: String,
}

/// Outcome of normalizing a photo list.
#[derive(Debug, Clone)]
pub struct AssetReport {
    /// Usable assets in input order, ordinals `0..len`.
    pub assets: Vec<MediaAsset>,
    pub skipped: Vec<SkippedAsset>,
}

/// Decode image bytes, apply the embedded orientation and drop any alpha
/// channel.
pub fn decode_upright_rgb(bytes: &[u8]) -> ReelResult<RgbImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| ReelError::Other(e.into()))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| ReelError::Other(e.into()))?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(|e| ReelError::Other(e.into()))?;
    image.apply_orientation(orientation);
    Ok(image.to_rgb8())
}

fn write_jpeg(image: &RgbImage, path: &Path, quality: u8) -> ReelResult<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(image)
        .map_err(|e| ReelError::Other(e.into()))?;
    Ok(())
}

/// Decode and persist on the blocking pool.
async fn persist(bytes: Vec<u8>, path: PathBuf) -> ReelResult<(u32, u32)> {
    tokio::task::spawn_blocking(move || -> ReelResult<(u32, u32)> {
        let image = decode_upright_rgb(&bytes)?;
        write_jpeg(&image, &path, SLIDE_JPEG_QUALITY)?;
        Ok(image.dimensions())
    })
    .await
    .map_err(|e| ReelError::Other(e.into()))?
}

/// Try each candidate in turn; the first one that fetches and decodes wins.
async fn normalize_one<F: AssetFetcher>(
    fetcher: &F,
    reference: &str,
    config: &FetchConfig,
    staging: PathBuf,
) -> Result<PathBuf, SkippedAsset> {
    let candidates =
        candidate_references(reference, config.upgrade_resolution, config.target_size_px);
    let mut last_error = String::from("no candidates");

    for candidate in &candidates {
        let attempt = async {
            let bytes = fetcher.fetch(candidate).await?;
            persist(bytes, staging.clone())
                .await
                .map_err(|e| ReelError::asset_fetch(candidate.as_str(), format!("decode failed: {e}")))
        };
        match attempt.await {
            Ok((width, height)) => {
                tracing::debug!(reference, candidate, width, height, "Asset normalized");
                return Ok(staging);
            }
            Err(e) => {
                tracing::debug!(reference, candidate, error = %e, "Asset candidate failed");
                last_error = e.to_string();
            }
        }
    }

    Err(SkippedAsset {
        reference: reference.to_string(),
        reason: last_error,
    })
}

/// Normalize `references`, keeping at most `limit` usable assets.
///
/// Failed photos are reported in `skipped`. Zero usable photos is an
/// `InsufficientAssets` error.
pub async fn normalize_assets<F: AssetFetcher>(
    fetcher: &F,
    references: &[String],
    config: &FetchConfig,
    workspace: &RunWorkspace,
    limit: usize,
) -> ReelResult<AssetReport> {
    let attempts = references.iter().enumerate().map(|(i, reference)| {
        let staging = workspace.file(&format!("source-{i}.jpg"));
        normalize_one(fetcher, reference, config, staging)
    });
    let outcomes = join_all(attempts).await;

    let mut assets = Vec::new();
    let mut skipped = Vec::new();
    for (reference, outcome) in references.iter().zip(outcomes) {
        match outcome {
            Ok(staging) if assets.len() < limit => {
                let ordinal = assets.len();
                let path = workspace.slide_path(ordinal);
                tokio::fs::rename(&staging, &path).await?;
                assets.push(MediaAsset::new(path, ordinal, reference.as_str()));
            }
            Ok(_) => {
                tracing::debug!(reference = reference.as_str(), limit, "Asset beyond slide limit");
            }
            Err(skip) => {
                tracing::warn!(
                    reference = skip.reference.as_str(),
                    reason = skip.reason.as_str(),
                    "Skipping asset"
                );
                skipped.push(skip);
            }
        }
    }

    if assets.is_empty() {
        return Err(ReelError::insufficient_assets(format!(
            "none of the {} photo(s) could be fetched and decoded",
            references.len()
        )));
    }

    tracing::info!(
        usable = assets.len(),
        skipped = skipped.len(),
        "Assets normalized"
    );
    Ok(AssetReport { assets, skipped })
}
