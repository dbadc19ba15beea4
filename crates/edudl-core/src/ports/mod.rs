//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.

pub mod download_manager;
pub mod download_observer;
pub mod transport;

pub use download_manager::{
    ConfigError, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_CONCURRENT,
    DownloadManagerConfig, DownloadManagerPort,
};
pub use download_observer::{DownloadObserverPort, NoopObserver};
pub use transport::{BodyStream, TransportPort, TransportResponse};
