//! Download registry.
//!
//! The authoritative in-memory map from id to `Download`. Insertion order is
//! preserved so `list` reflects submission order. Like the scheduler, this is
//! plain data guarded by the manager's state lock.

mod filename;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use edudl_core::download::{Download, DownloadId};

use filename::{numbered_filename, sanitize_filename};

/// Id-keyed store of every known download.
#[derive(Debug)]
pub struct DownloadRegistry {
    downloads_dir: PathBuf,
    entries: IndexMap<DownloadId, Download>,
}

impl DownloadRegistry {
    /// Create an empty registry resolving destinations under `downloads_dir`.
    pub fn new(downloads_dir: PathBuf) -> Self {
        Self {
            downloads_dir,
            entries: IndexMap::new(),
        }
    }

    /// Create and register a pending download.
    ///
    /// The requested name is reduced to its final path component. An unusable
    /// name becomes `download-<id>`. A name whose path is owned by another
    /// registered download, or for which `reserved` returns true, gets a
    /// numeric suffix.
    pub fn add(
        &mut self,
        url: &str,
        filename: &str,
        reserved: impl Fn(&Path) -> bool,
    ) -> Download {
        let id = DownloadId::generate();
        let requested = sanitize_filename(filename).unwrap_or_else(|| format!("download-{id}"));
        let (filename, local_path) = self.claim_destination(&requested, reserved);

        let download = Download::new(id, url, filename, local_path);
        self.entries.insert(id, download.clone());
        download
    }

    /// Look up one download.
    pub fn get(&self, id: &DownloadId) -> Option<&Download> {
        self.entries.get(id)
    }

    /// Mutable lookup, for the manager's state transitions.
    pub fn get_mut(&mut self, id: &DownloadId) -> Option<&mut Download> {
        self.entries.get_mut(id)
    }

    /// Whether an id is registered.
    #[cfg(test)]
    pub fn contains(&self, id: &DownloadId) -> bool {
        self.entries.contains_key(id)
    }

    /// Copy of every download in insertion order.
    pub fn list(&self) -> Vec<Download> {
        self.entries.values().cloned().collect()
    }

    /// Number of registered downloads.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop every terminal download. Files on disk are not touched.
    pub fn remove_terminal(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, download| !download.is_terminal());
        before - self.entries.len()
    }

    fn claim_destination(
        &self,
        requested: &str,
        reserved: impl Fn(&Path) -> bool,
    ) -> (String, PathBuf) {
        let mut candidate = requested.to_string();
        let mut n = 0;
        loop {
            let path = self.downloads_dir.join(&candidate);
            if !self.path_taken(&path) && !reserved(&path) {
                return (candidate, path);
            }
            n += 1;
            candidate = numbered_filename(requested, n);
        }
    }

    fn path_taken(&self, path: &Path) -> bool {
        self.entries.values().any(|d| d.local_path == path)
    }
}
