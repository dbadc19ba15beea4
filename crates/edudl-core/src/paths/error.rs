//! Path-related error types.

use thiserror::Error;

/// Errors that can occur while resolving the downloads directory.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the user's home directory.
    #[error("Cannot determine home directory")]
    NoHomeDir,

    /// An empty path was provided.
    #[error("Path cannot be empty")]
    EmptyPath,

    /// Could not read the current working directory.
    #[error("Cannot determine current directory: {0}")]
    CurrentDirError(String),
}
