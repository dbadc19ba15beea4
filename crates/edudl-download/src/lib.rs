//! Concurrent download manager for course materials.
//!
//! Accepts download requests, queues them FIFO, runs a bounded number of
//! transfers at once, streams each response body to disk and tracks every
//! download through `pending → downloading → completed | failed | cancelled`.
//!
//! # Modules
//!
//! - `registry` - id → `Download` store with destination naming
//! - `scheduler` - FIFO admission queue with a concurrency bound
//! - `progress` - whole-percent progress throttling
//! - `manager` - the `DownloadManagerPort` implementation and transfer worker
//! - `transport` - `reqwest`-backed `TransportPort`
//! - `observer` - `watch`-channel snapshot observer
//!
//! # Usage
//!
//! ```ignore
//! let observer = Arc::new(WatchObserver::new());
//! let manager = build_download_manager(DownloadManagerDeps {
//!     transport: Arc::new(ReqwestTransport::from_config(&config)?),
//!     observer: Arc::clone(&observer),
//!     config,
//! })?;
//! manager.add("https://lms.example/week1.pdf", "week1.pdf").await;
//! ```

// Re-export core types for convenience
pub use edudl_core::download::{
    Download, DownloadError, DownloadId, DownloadStatus, DownloadsSnapshot,
};
pub use edudl_core::ports::{
    ConfigError, DownloadManagerConfig, DownloadManagerPort, DownloadObserverPort, NoopObserver,
    TransportPort, TransportResponse,
};

// Internal modules (pub(crate) to keep implementation private)
pub(crate) mod progress;
pub(crate) mod registry;
pub(crate) mod scheduler;

// Re-export progress throttle for consumers (adapters)
pub use progress::ProgressThrottle;

mod observer;
mod transport;

pub use observer::WatchObserver;
pub use transport::ReqwestTransport;

// Public API - download manager
mod manager;

pub use manager::{DownloadManagerDeps, DownloadManagerImpl, build_download_manager};
