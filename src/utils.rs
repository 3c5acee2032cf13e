// ABOUTME: Utility functions for the auto-slides application
// ABOUTME: Provides path helpers and the per-run scratch directory for downloads

use crate::errors::{Result, SlidesError};
use log::{debug, warn};
use std::path::Path;
use tempfile::TempDir;

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(SlidesError::FileReadError)?;
    } else if !path.is_dir() {
        return Err(SlidesError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory_exists(parent),
        _ => Ok(()),
    }
}

/// Scratch directory for downloaded images, owned by a single run.
///
/// The directory and everything in it is removed when this value is closed or
/// dropped, whichever happens first.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("auto-slides-images-")
            .tempdir()
            .map_err(SlidesError::FileReadError)?;
        debug!("Created scratch directory {:?}", dir.path());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now. Failures are logged, not returned.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!("Removed scratch directory {:?}", path),
            Err(e) => warn!("Failed to clean up scratch directory {:?}: {}", path, e),
        }
    }
}
