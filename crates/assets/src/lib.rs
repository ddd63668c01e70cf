//! Reelwright Assets
//!
//! Turns photo references into normalized local stills:
//! - **Rewrite:** Ask image CDNs for a larger rendition, falling back to the original
//! - **Fetch:** HTTP and local-file fetchers behind one trait
//! - **Normalize:** Upright, 8-bit RGB JPEG files in a per-run workspace
//!
//! A failed asset is skipped and reported; only a run with no usable image
//! at all is an error.

pub mod fetch;
pub mod normalize;
pub mod rewrite;
pub mod workspace;

pub use fetch::{AssetFetcher, HttpFetcher, LocalFetcher, ReferenceFetcher};
pub use normalize::{decode_upright_rgb, normalize_assets, AssetReport, SkippedAsset};
pub use rewrite::{candidate_references, upscale_reference};
pub use workspace::RunWorkspace;
