//! Byte fetchers for photo references.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reelwright_common::{FetchConfig, ReelError, ReelResult};
use reelwright_model::is_remote_reference;

/// Source of raw image bytes.
///
/// Failures are `AssetFetch` errors naming the reference.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, reference: &str) -> impl Future<Output = ReelResult<Vec<u8>>> + Send;
}

/// HTTP(S) fetcher with a per-request timeout and a browser User-Agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> ReelResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ReelError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, reference: &str) -> ReelResult<Vec<u8>> {
        let response = self
            .client
            .get(reference)
            .send()
            .await
            .map_err(|e| ReelError::asset_fetch(reference, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReelError::asset_fetch(reference, format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReelError::asset_fetch(reference, format!("body read failed: {e}")))?;
        tracing::debug!(reference, bytes = bytes.len(), "Fetched remote asset");
        Ok(bytes.to_vec())
    }
}

/// Reads local files. `file://` prefixes are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl AssetFetcher for LocalFetcher {
    async fn fetch(&self, reference: &str) -> ReelResult<Vec<u8>> {
        let path = PathBuf::from(reference.strip_prefix("file://").unwrap_or(reference));
        tokio::fs::read(&path)
            .await
            .map_err(|e| ReelError::asset_fetch(reference, format!("read failed: {e}")))
    }
}

/// Dispatches URLs to [`HttpFetcher`] and everything else to
/// [`LocalFetcher`].
#[derive(Debug, Clone)]
pub struct ReferenceFetcher {
    http: HttpFetcher,
    local: LocalFetcher,
}

impl ReferenceFetcher {
    pub fn new(config: &FetchConfig) -> ReelResult<Self> {
        Ok(Self {
            http: HttpFetcher::new(config)?,
            local: LocalFetcher,
        })
    }
}

impl AssetFetcher for ReferenceFetcher {
    async fn fetch(&self, reference: &str) -> ReelResult<Vec<u8>> {
        if is_remote_reference(reference) {
            self.http.fetch(reference).await
        } else {
            self.local.fetch(reference).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.bin");
        std::fs::write(&path, b"bytes").unwrap();

        let reference = path.to_string_lossy().into_owned();
        assert_eq!(LocalFetcher.fetch(&reference).await.unwrap(), b"bytes");

        let prefixed = format!("file://{reference}");
        assert_eq!(LocalFetcher.fetch(&prefixed).await.unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_missing_local_file_is_asset_error() {
        let fetcher = ReferenceFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher.fetch("/definitely/not/here.jpg").await.unwrap_err();
        assert!(matches!(err, ReelError::AssetFetch { .. }));
        assert!(err.is_recoverable());
    }
}
