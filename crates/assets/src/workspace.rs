//! Per-run scratch directory.
//!
//! Normalized images and intermediate subtitle files live in a
//! [`RunWorkspace`]. The directory is removed when the workspace is dropped,
//! so every exit path of a run cleans up after itself.

use std::path::{Path, PathBuf};

use reelwright_common::{ReelError, ReelResult};
use tempfile::TempDir;

/// Temporary directory owned by one pipeline run.
#[derive(Debug)]
pub struct RunWorkspace {
    temp_dir: TempDir,
}

impl RunWorkspace {
    /// Create a workspace under the system temp directory.
    pub fn new() -> ReelResult<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("reelwright-")
            .tempdir()
            .map_err(|e| ReelError::config(format!("failed to create run workspace: {e}")))?;
        tracing::debug!(path = %temp_dir.path().display(), "Run workspace created");
        Ok(Self { temp_dir })
    }

    /// Create a workspace under `parent` (which must exist).
    pub fn new_in(parent: &Path) -> ReelResult<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("reelwright-")
            .tempdir_in(parent)
            .map_err(|e| ReelError::config(format!("failed to create run workspace: {e}")))?;
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// File name used for the normalized image at `ordinal`.
    pub fn slide_path(&self, ordinal: usize) -> PathBuf {
        self.file(&format!("slide-{ordinal}.jpg"))
    }

    /// Remove the directory now, reporting failures instead of ignoring
    /// them as `Drop` does.
    pub fn close(self) -> ReelResult<()> {
        let path = self.temp_dir.path().to_path_buf();
        self.temp_dir.close()?;
        tracing::debug!(path = %path.display(), "Run workspace removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_removes_directory() {
        let workspace = RunWorkspace::new().unwrap();
        let dir = workspace.path().to_path_buf();
        std::fs::write(workspace.slide_path(0), b"jpeg").unwrap();
        assert!(dir.exists());
        drop(workspace);
        assert!(!dir.exists());
    }

    #[test]
    fn test_close_and_naming() {
        let parent = tempfile::tempdir().unwrap();
        let workspace = RunWorkspace::new_in(parent.path()).unwrap();
        assert!(workspace.path().starts_with(parent.path()));
        assert!(workspace
            .slide_path(3)
            .to_string_lossy()
            .ends_with("slide-3.jpg"));
        let dir = workspace.path().to_path_buf();
        workspace.close().unwrap();
        assert!(!dir.exists());
    }
}
