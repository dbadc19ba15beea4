//! Downloads directory resolution.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - the CLI handles user input separately
//! - No directories are created here; the worker creates parents on first write

mod downloads;
mod error;
mod platform;

#[cfg(test)]
mod test_utils;

pub use downloads::{
    DOWNLOADS_DIR_ENV, DownloadsDirResolution, DownloadsDirSource, default_downloads_dir,
    resolve_downloads_dir,
};
pub use error::PathError;
