//! Core domain types for downloads.
//!
//! Pure data types with no I/O dependencies.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for a download.
///
/// Generated once at submission time and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(Uuid);

impl DownloadId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DownloadId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle status of a download.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// Waiting to be admitted (queued, or paused).
    Pending,
    /// A transfer worker owns this download.
    Downloading,
    /// All bytes were written to disk.
    Completed,
    /// The transfer failed; see `Download::error`.
    Failed,
    /// Cancelled by the caller.
    Cancelled,
}

impl DownloadStatus {
    /// String form used in logs and the CLI.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states never transition again on their own.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested file transfer and its lifecycle state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Download {
    /// Unique identifier.
    pub id: DownloadId,
    /// Source URL.
    pub url: String,
    /// Destination file name (final path component only).
    pub filename: String,
    /// Fully resolved destination under the downloads directory.
    pub local_path: PathBuf,
    /// Current lifecycle status.
    pub status: DownloadStatus,
    /// Percentage in `[0, 100]`; stays 0 while the total size is unknown.
    pub progress: f64,
    /// Byte count advertised by the server, 0 if not advertised.
    pub total_size: u64,
    /// Bytes received so far.
    pub downloaded_size: u64,
    /// Set when the download enters `downloading`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Set when the download reaches a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure message, only present when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Download {
    /// Create a pending download with zeroed progress.
    pub fn new(
        id: DownloadId,
        url: impl Into<String>,
        filename: impl Into<String>,
        local_path: PathBuf,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            filename: filename.into(),
            local_path,
            status: DownloadStatus::Pending,
            progress: 0.0,
            total_size: 0,
            downloaded_size: 0,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Whether this download is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Add received bytes and recompute `progress`.
    pub fn record_bytes(&mut self, len: u64) {
        self.downloaded_size = self.downloaded_size.saturating_add(len);
        self.progress = percent(self.downloaded_size, self.total_size);
    }
}

/// Percentage of `downloaded` over `total`, or 0 when `total` is unknown.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent(downloaded: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (downloaded as f64 / total as f64 * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_download_is_pending_with_zero_progress() {
        let id = DownloadId::generate();
        let dl = Download::new(id, "https://x/file", "a.bin", PathBuf::from("/tmp/a.bin"));

        assert_eq!(dl.status, DownloadStatus::Pending);
        assert!(dl.progress.abs() < f64::EPSILON);
        assert_eq!(dl.total_size, 0);
        assert!(dl.started_at.is_none());
        assert!(dl.error.is_none());
    }

    #[test]
    fn record_bytes_updates_progress_when_total_known() {
        let mut dl = Download::new(
            DownloadId::generate(),
            "u",
            "f",
            PathBuf::from("/tmp/f"),
        );
        dl.total_size = 200;
        dl.record_bytes(50);
        assert!((dl.progress - 25.0).abs() < f64::EPSILON);
        dl.record_bytes(150);
        assert!((dl.progress - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn record_bytes_keeps_progress_zero_without_total() {
        let mut dl = Download::new(
            DownloadId::generate(),
            "u",
            "f",
            PathBuf::from("/tmp/f"),
        );
        dl.record_bytes(4096);
        assert_eq!(dl.downloaded_size, 4096);
        assert!(dl.progress.abs() < f64::EPSILON);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!DownloadStatus::Pending.is_terminal());
        assert!(!DownloadStatus::Downloading.is_terminal());
        assert!(DownloadStatus::Completed.is_terminal());
        assert!(DownloadStatus::Failed.is_terminal());
        assert!(DownloadStatus::Cancelled.is_terminal());
    }

    #[test]
    fn id_parses_back_from_display() {
        let id = DownloadId::generate();
        let parsed: DownloadId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<DownloadId>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DownloadStatus::Downloading).unwrap();
        assert_eq!(json, "\"downloading\"");
    }
}
