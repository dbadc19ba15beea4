//! Download manager port definition.
//!
//! This port defines the public interface for the download subsystem.
//! It hides transfer tasks, cancellation tokens and leases behind a small
//! async API consumed by the host glue.
//!
//! # Design
//!
//! - Only core download domain types in signatures
//! - Invalid transitions and unknown ids are reported as `false` / `None`,
//!   never as errors

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::download::{Download, DownloadId, DownloadsSnapshot};

/// Default number of transfers allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: u32 = 3;

/// Default idle window before a stalled transfer is failed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default TCP/TLS connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration rejected by `DownloadManagerConfig::validate`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// At least one transfer must be allowed.
    #[error("max_concurrent must be at least 1")]
    ZeroConcurrency,

    /// A zero idle timeout would fail every transfer immediately.
    #[error("idle_timeout must be greater than zero when set")]
    ZeroIdleTimeout,

    /// The downloads directory path is empty.
    #[error("downloads directory cannot be empty")]
    EmptyDownloadsDir,
}

/// Configuration for creating a download manager.
#[derive(Debug, Clone)]
pub struct DownloadManagerConfig {
    /// Directory every `local_path` is resolved under.
    pub downloads_directory: PathBuf,
    /// Maximum concurrent transfers.
    pub max_concurrent: u32,
    /// Fail a transfer when no chunk arrives within this window.
    /// `None` waits forever.
    pub idle_timeout: Option<Duration>,
    /// Connect timeout for the HTTP transport.
    pub connect_timeout: Duration,
    /// User agent for the HTTP transport.
    pub user_agent: String,
}

impl Default for DownloadManagerConfig {
    fn default() -> Self {
        Self {
            downloads_directory: PathBuf::from("."),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            idle_timeout: Some(DEFAULT_IDLE_TIMEOUT),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: concat!("edudl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DownloadManagerConfig {
    /// Create a new config with the downloads directory.
    #[must_use]
    pub fn new(downloads_directory: PathBuf) -> Self {
        Self {
            downloads_directory,
            ..Default::default()
        }
    }

    /// Set the maximum concurrent transfers.
    #[must_use]
    pub const fn with_max_concurrent(mut self, max: u32) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Set (or disable) the idle timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Reject configurations the manager cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.idle_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        if self.downloads_directory.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDownloadsDir);
        }
        Ok(())
    }
}

/// Port for managing downloads.
///
/// # Usage
///
/// ```ignore
/// let manager: Arc<dyn DownloadManagerPort> = /* ... */;
///
/// let download = manager.add("https://example.com/week1.pdf", "week1.pdf").await;
/// manager.pause(&download.id).await;
/// manager.resume(&download.id).await;
/// ```
#[async_trait]
pub trait DownloadManagerPort: Send + Sync {
    /// Register a new download and schedule it. No network or disk I/O
    /// happens before this returns.
    async fn add(&self, url: &str, filename: &str) -> Download;

    /// Look up one download.
    async fn get(&self, id: &DownloadId) -> Option<Download>;

    /// All known downloads in insertion order.
    async fn list(&self) -> Vec<Download>;

    /// Move a `downloading` item back to `pending`. False otherwise.
    async fn pause(&self, id: &DownloadId) -> bool;

    /// Re-queue a `pending` item. False otherwise.
    async fn resume(&self, id: &DownloadId) -> bool;

    /// Cancel any known download and delete its file. False for unknown ids.
    async fn cancel(&self, id: &DownloadId) -> bool;

    /// Drop every terminal download from the registry. Files are untouched.
    /// Returns how many entries were removed.
    async fn clear_completed(&self) -> usize;

    /// Current full state.
    async fn snapshot(&self) -> DownloadsSnapshot;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DownloadManagerConfig::new(PathBuf::from("/tmp/downloads"));
        assert_eq!(config.max_concurrent, 3);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = DownloadManagerConfig::new(PathBuf::from("/tmp")).with_max_concurrent(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn zero_idle_timeout_rejected() {
        let config =
            DownloadManagerConfig::new(PathBuf::from("/tmp")).with_idle_timeout(Some(Duration::ZERO));
        assert_eq!(config.validate(), Err(ConfigError::ZeroIdleTimeout));

        let disabled = DownloadManagerConfig::new(PathBuf::from("/tmp")).with_idle_timeout(None);
        assert_eq!(disabled.validate(), Ok(()));
    }

    #[test]
    fn empty_directory_rejected() {
        let config = DownloadManagerConfig::new(PathBuf::new());
        assert_eq!(config.validate(), Err(ConfigError::EmptyDownloadsDir));
    }
}
