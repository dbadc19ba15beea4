//! Download observer port.
//!
//! This port abstracts snapshot delivery, allowing the download manager
//! to publish state without coupling to the host (window, CLI, channel).

use crate::download::DownloadsSnapshot;

/// Port for receiving download state.
///
/// The manager calls `on_snapshot` after every state-affecting event with
/// the full current list. Snapshots may repeat, and intermediate progress
/// values may be skipped; implementations should treat the most recent
/// `seq` as authoritative.
pub trait DownloadObserverPort: Send + Sync {
    /// Receive a full snapshot.
    ///
    /// Called outside the manager's state lock. This method should not block.
    fn on_snapshot(&self, snapshot: &DownloadsSnapshot);
}

/// A no-op observer for tests and headless contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl NoopObserver {
    /// Create a new no-op observer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DownloadObserverPort for NoopObserver {
    fn on_snapshot(&self, _snapshot: &DownloadsSnapshot) {}
}
