//! Core domain types and ports for the course-material download manager.
//!
//! This crate holds everything the download engine and its hosts agree on:
//! the `Download` entity and its lifecycle states, the snapshot pushed to
//! observers, the error taxonomy, configuration, and the port traits for
//! the network transport and the observer. It performs no I/O of its own
//! apart from reading environment variables during path resolution.

pub mod download;
pub mod paths;
pub mod ports;

pub use download::{
    Download, DownloadError, DownloadId, DownloadStatus, DownloadsSnapshot,
    percent,
};
pub use paths::{PathError, resolve_downloads_dir};
pub use ports::{
    BodyStream, ConfigError, DownloadManagerConfig, DownloadManagerPort, DownloadObserverPort,
    NoopObserver, TransportPort, TransportResponse,
};
