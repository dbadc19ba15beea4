//! Snapshot DTO pushed to observers.
//!
//! Observers always receive the full download list, never a diff. Snapshots
//! are numbered so a consumer can discard one that arrives after a newer one.

use serde::{Deserialize, Serialize};

use super::types::{Download, DownloadId, DownloadStatus};

/// Full state of the download manager at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadsSnapshot {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    /// Every known download, in insertion order.
    pub downloads: Vec<Download>,
    /// Number of transfer workers currently holding a slot.
    pub active_count: u32,
    /// Number of ids waiting in the admission queue.
    pub pending_count: u32,
}

impl DownloadsSnapshot {
    /// Look up a download by id.
    pub fn get(&self, id: &DownloadId) -> Option<&Download> {
        self.downloads.iter().find(|d| &d.id == id)
    }

    /// Status of a download, if present.
    pub fn status_of(&self, id: &DownloadId) -> Option<DownloadStatus> {
        self.get(id).map(|d| d.status)
    }

    /// Count downloads currently in `status`.
    pub fn count_with_status(&self, status: DownloadStatus) -> usize {
        self.downloads.iter().filter(|d| d.status == status).count()
    }

    /// True when nothing is queued or transferring.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active_count == 0
            && self.pending_count == 0
            && self.count_with_status(DownloadStatus::Downloading) == 0
    }

    /// True when every download has reached a terminal state.
    #[must_use]
    pub fn all_terminal(&self) -> bool {
        self.downloads.iter().all(Download::is_terminal)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn sample(status: DownloadStatus) -> Download {
        let mut dl = Download::new(DownloadId::generate(), "u", "f", PathBuf::from("/tmp/f"));
        dl.status = status;
        dl
    }

    #[test]
    fn counts_and_lookup() {
        let a = sample(DownloadStatus::Downloading);
        let b = sample(DownloadStatus::Pending);
        let id = a.id;
        let snapshot = DownloadsSnapshot {
            seq: 4,
            downloads: vec![a, b],
            active_count: 1,
            pending_count: 1,
        };

        assert_eq!(snapshot.status_of(&id), Some(DownloadStatus::Downloading));
        assert_eq!(snapshot.count_with_status(DownloadStatus::Pending), 1);
        assert!(!snapshot.is_idle());
        assert!(!snapshot.all_terminal());
    }

    #[test]
    fn empty_snapshot_is_idle() {
        let snapshot = DownloadsSnapshot::default();
        assert!(snapshot.is_idle());
        assert!(snapshot.all_terminal());
    }
}
