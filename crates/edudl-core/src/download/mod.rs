//! Download domain types, snapshots, and errors.
//!
//! This module contains pure data types for the download system. No I/O,
//! networking, or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `types` - `DownloadId`, `DownloadStatus`, the `Download` entity
//! - `snapshot` - `DownloadsSnapshot` pushed to observers
//! - `errors` - Error types for download operations

pub mod errors;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use errors::DownloadError;
pub use snapshot::DownloadsSnapshot;
pub use types::{Download, DownloadId, DownloadStatus, percent};
