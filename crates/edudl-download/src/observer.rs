//! Observer adapters.
//!
//! `WatchObserver` bridges the synchronous `DownloadObserverPort` onto a
//! `tokio::sync::watch` channel so hosts can `await` state changes.

use tokio::sync::watch;

use edudl_core::download::DownloadsSnapshot;
use edudl_core::ports::DownloadObserverPort;

/// Publishes snapshots on a watch channel, keeping only the newest.
///
/// The manager calls observers outside its lock, so two snapshots can
/// arrive out of order. A snapshot with a `seq` lower than or equal to the
/// current one is dropped without waking receivers.
#[derive(Debug)]
pub struct WatchObserver {
    tx: watch::Sender<DownloadsSnapshot>,
}

impl WatchObserver {
    /// Create an observer holding an empty snapshot.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DownloadsSnapshot::default());
        Self { tx }
    }

    /// Receive future snapshots.
    pub fn subscribe(&self) -> watch::Receiver<DownloadsSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for WatchObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadObserverPort for WatchObserver {
    fn on_snapshot(&self, snapshot: &DownloadsSnapshot) {
        // send_if_modified works without receivers and never fails
        self.tx.send_if_modified(|current| {
            if snapshot.seq <= current.seq {
                return false;
            }
            current.clone_from(snapshot);
            true
        });
    }
}
