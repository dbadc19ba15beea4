//! Filesystem helpers for download destinations.

use std::io;
use std::path::Path;

use tokio::fs;

use edudl_core::download::DownloadError;

/// Ensure the destination's parent directory exists, creating it if necessary.
pub async fn ensure_parent_dir(path: &Path) -> Result<(), DownloadError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::from_io_error(&e))?;
        }
    }
    Ok(())
}

/// Delete a destination file, logging (never returning) failures.
///
/// A file that does not exist is not an error.
pub async fn remove_file_best_effort(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed download file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove download file");
        }
    }
}
