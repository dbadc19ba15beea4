//! Download manager implementation.
//!
//! This module provides the concrete implementation of `DownloadManagerPort`
//! with lease-based state management and a clean separation between the
//! worker (byte streaming) and the manager (registry, scheduler, observers).
//!
//! # Architecture
//!
//! - **Manager**: owns the registry, scheduler and leases behind one lock
//! - **Worker**: streams one download to disk, reporting through a `TransferSink`
//! - **Observer**: receives a full snapshot after every state change
//!
//! # Concurrency Model
//!
//! - One `tokio::sync::Mutex` guards all state, so admission (pop + slot +
//!   status change) is atomic with respect to every other operation
//! - Each admission mints a lease; pause and cancel revoke it and trip the
//!   job's `CancellationToken`, after which the worker can no longer commit
//! - Each worker releases its slot exactly once, in `finalize`, on every exit path
//! - Workers for the same destination are serialized by a per-path file lock,
//!   and a path stays reserved until its last worker has deleted what it left
//! - Observers are called after the state lock is released

mod paths;
mod worker;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use edudl_core::download::{
    Download, DownloadError, DownloadId, DownloadStatus, DownloadsSnapshot,
};
use edudl_core::ports::{
    ConfigError, DownloadManagerConfig, DownloadManagerPort, DownloadObserverPort, TransportPort,
};

use crate::progress::ProgressThrottle;
use crate::registry::DownloadRegistry;
use crate::scheduler::Scheduler;

use paths::remove_file_best_effort;

use worker::{CompletedTransfer, DownloadJob, TransferSink, WorkerDeps, run_job};

/// Lease ID for tracking active downloads.
///
/// Used to prevent stale commits from a worker whose download was paused,
/// cancelled or re-admitted while it was still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LeaseId(u64);

/// State for an admitted download.
struct ActiveLease {
    /// Unique lease for this execution.
    lease: LeaseId,
    /// Cancellation token.
    cancel: CancellationToken,
}

/// Everything guarded by the manager's lock.
struct ManagerState {
    registry: DownloadRegistry,
    scheduler: Scheduler,
    /// Current owner of each downloading item.
    leases: HashMap<DownloadId, ActiveLease>,
    /// Destinations with a worker that has not finished its cleanup.
    path_claims: HashMap<PathBuf, PathClaim>,
    seq: u64,
    shutting_down: bool,
}

/// Reservation of a destination path by its live workers.
#[derive(Default)]
struct PathClaim {
    /// Held by a worker from before its first byte until after its cleanup.
    lock: Arc<Mutex<()>>,
    workers: usize,
}

impl ManagerState {
    fn owns(&self, id: &DownloadId, lease: LeaseId) -> bool {
        self.leases.get(id).is_some_and(|active| active.lease == lease)
    }

    /// Register a worker on `path` and return the lock it must hold.
    fn claim_path(&mut self, path: &Path) -> Arc<Mutex<()>> {
        let claim = self.path_claims.entry(path.to_path_buf()).or_default();
        claim.workers += 1;
        Arc::clone(&claim.lock)
    }

    /// Drop one worker's claim; the path is free again after the last one.
    fn release_path(&mut self, path: &Path) {
        if let Some(claim) = self.path_claims.get_mut(path) {
            claim.workers = claim.workers.saturating_sub(1);
            if claim.workers == 0 {
                self.path_claims.remove(path);
            }
        }
    }

    /// Build the next numbered snapshot.
    fn snapshot(&mut self) -> DownloadsSnapshot {
        self.seq += 1;
        DownloadsSnapshot {
            seq: self.seq,
            downloads: self.registry.list(),
            active_count: self.scheduler.active_count(),
            pending_count: u32::try_from(self.scheduler.pending_len()).unwrap_or(u32::MAX),
        }
    }
}

/// A download that was just moved to `downloading` and needs a worker.
struct Admission {
    job: DownloadJob,
    lease: LeaseId,
    file_lock: Arc<Mutex<()>>,
}

/// Dependencies for creating a download manager.
pub struct DownloadManagerDeps<T, O>
where
    T: TransportPort + 'static,
    O: DownloadObserverPort + 'static,
{
    /// Network transport.
    pub transport: Arc<T>,
    /// Receiver of state snapshots.
    pub observer: Arc<O>,
    /// Configuration.
    pub config: DownloadManagerConfig,
}

/// Build a download manager from its dependencies.
///
/// Returns an implementation of `DownloadManagerPort` that can be
/// stored as `Arc<dyn DownloadManagerPort>` in adapters.
pub fn build_download_manager<T, O>(
    deps: DownloadManagerDeps<T, O>,
) -> Result<DownloadManagerImpl, ConfigError>
where
    T: TransportPort + 'static,
    O: DownloadObserverPort + 'static,
{
    deps.config.validate()?;
    Ok(DownloadManagerImpl::new(
        deps.transport,
        deps.observer,
        &deps.config,
    ))
}

/// Concrete implementation of the download manager.
///
/// This struct is public but adapters should typically use
/// `Arc<dyn DownloadManagerPort>` instead of depending on this type directly.
/// Operations spawn worker tasks and must be called from a Tokio runtime.
pub struct DownloadManagerImpl {
    shared: Arc<Shared>,
}

/// State shared between the manager handle and its worker tasks.
struct Shared {
    state: Mutex<ManagerState>,
    worker_deps: WorkerDeps,
    observer: Arc<dyn DownloadObserverPort>,
    /// Counter for generating lease IDs.
    lease_counter: AtomicU64,
}

impl DownloadManagerImpl {
    fn new(
        transport: Arc<dyn TransportPort>,
        observer: Arc<dyn DownloadObserverPort>,
        config: &DownloadManagerConfig,
    ) -> Self {
        let state = ManagerState {
            registry: DownloadRegistry::new(config.downloads_directory.clone()),
            scheduler: Scheduler::new(config.max_concurrent),
            leases: HashMap::new(),
            path_claims: HashMap::new(),
            seq: 0,
            shutting_down: false,
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                worker_deps: WorkerDeps {
                    transport,
                    idle_timeout: config.idle_timeout,
                },
                observer,
                lease_counter: AtomicU64::new(0),
            }),
        }
    }

    /// Number of workers currently holding a slot.
    pub async fn active_count(&self) -> u32 {
        self.shared.state.lock().await.scheduler.active_count()
    }

    /// Number of ids waiting for admission.
    pub async fn pending_count(&self) -> usize {
        self.shared.state.lock().await.scheduler.pending_len()
    }

    /// Stop admitting work and cancel every running transfer.
    ///
    /// Running downloads end as `cancelled` with their partial files deleted.
    /// Queued downloads stay `pending`. Returns how many transfers were signalled.
    pub async fn shutdown(&self) -> usize {
        let mut state = self.shared.state.lock().await;
        state.shutting_down = true;
        for active in state.leases.values() {
            active.cancel.cancel();
        }
        let count = state.leases.len();
        tracing::info!(target: "edudl.download", count = count, "Shutdown: cancelled active transfers");
        count
    }
}

impl Shared {
    fn next_lease(&self) -> LeaseId {
        LeaseId(self.lease_counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Admit queued downloads while capacity remains.
    ///
    /// Must be called with the state lock held; the returned admissions are
    /// spawned by the caller after the lock is released.
    fn admit(&self, state: &mut ManagerState) -> Vec<Admission> {
        let mut admitted = Vec::new();
        if state.shutting_down {
            return admitted;
        }

        while let Some(id) = state.scheduler.next_admission() {
            let Some(download) = state
                .registry
                .get_mut(&id)
                .filter(|d| d.status == DownloadStatus::Pending)
            else {
                tracing::debug!(id = %id, "Skipping queued id that is no longer pending");
                state.scheduler.release();
                continue;
            };

            download.status = DownloadStatus::Downloading;
            download.started_at = Some(Utc::now());
            download.completed_at = None;
            download.error = None;
            download.total_size = 0;
            download.downloaded_size = 0;
            download.progress = 0.0;

            let lease = self.next_lease();
            let cancel = CancellationToken::new();
            let job = DownloadJob {
                id,
                url: download.url.clone(),
                local_path: download.local_path.clone(),
                cancel: cancel.clone(),
            };
            state.leases.insert(id, ActiveLease { lease, cancel });
            let file_lock = state.claim_path(&job.local_path);

            tracing::debug!(id = %id, lease = lease.0, "Admitted download");
            admitted.push(Admission {
                job,
                lease,
                file_lock,
            });
        }

        admitted
    }

    fn spawn_all(self: &Arc<Self>, admissions: Vec<Admission>) {
        for admission in admissions {
            let shared = Arc::clone(self);
            tokio::spawn(async move { shared.run_admitted(admission).await });
        }
    }

    /// Worker task body: run the transfer in its own task, then finalize.
    async fn run_admitted(self: Arc<Self>, admission: Admission) {
        let Admission {
            job,
            lease,
            file_lock,
        } = admission;
        let _file_guard = file_lock.lock_owned().await;

        let id = job.id;
        let local_path = job.local_path.clone();
        let deps = self.worker_deps.clone();
        let mut sink = LeaseSink::new(Arc::clone(&self), id, lease);

        // A panic inside the transfer surfaces as a JoinError here instead of
        // unwinding past the slot release.
        let handle = tokio::spawn(async move { run_job(&job, &deps, &mut sink).await });
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(id = %id, error = %e, "Transfer task aborted");
                Err(DownloadError::other(format!("transfer task aborted: {e}")))
            }
        };

        self.finalize(id, lease, &local_path, result).await;
    }

    /// Finalize a job after it completes, fails or is cancelled.
    ///
    /// Verifies the lease to prevent stale commits, always releases the
    /// worker's slot and path claim, and re-runs admission. Leftover bytes
    /// are deleted before the claim is dropped.
    async fn finalize(
        self: &Arc<Self>,
        id: DownloadId,
        lease: LeaseId,
        local_path: &Path,
        result: Result<CompletedTransfer, DownloadError>,
    ) {
        let (snapshot, admissions) = {
            let mut state = self.state.lock().await;
            let owned = state.owns(&id, lease);
            if owned {
                state.leases.remove(&id);
                if let Some(download) = state.registry.get_mut(&id) {
                    apply_outcome(download, &result);
                }
            } else {
                tracing::debug!(id = %id, "Ignoring stale finalize (lease revoked)");
            }

            if result.is_err() || !owned {
                remove_file_best_effort(local_path).await;
            }
            state.release_path(local_path);

            state.scheduler.release();
            let admissions = self.admit(&mut state);
            (state.snapshot(), admissions)
        };

        self.spawn_all(admissions);
        self.observer.on_snapshot(&snapshot);
    }
}

/// Record a worker's result on the download it owned.
fn apply_outcome(download: &mut Download, result: &Result<CompletedTransfer, DownloadError>) {
    download.completed_at = Some(Utc::now());
    match result {
        Ok(done) => {
            download.status = DownloadStatus::Completed;
            download.downloaded_size = done.downloaded;
            download.total_size = done.total;
            download.progress = 100.0;
            download.error = None;
            tracing::info!(
                target: "edudl.download",
                id = %download.id,
                bytes = done.downloaded,
                path = %download.local_path.display(),
                "Download completed"
            );
        }
        Err(DownloadError::Cancelled) => {
            download.status = DownloadStatus::Cancelled;
            download.error = None;
            tracing::info!(target: "edudl.download", id = %download.id, "Download cancelled");
        }
        Err(e) => {
            download.status = DownloadStatus::Failed;
            download.error = Some(e.to_string());
            tracing::warn!(target: "edudl.download", id = %download.id, error = %e, "Download failed");
        }
    }
}

/// Sink that commits worker progress only while the lease is current.
struct LeaseSink {
    shared: Arc<Shared>,
    id: DownloadId,
    lease: LeaseId,
    throttle: ProgressThrottle,
}

impl LeaseSink {
    const fn new(shared: Arc<Shared>, id: DownloadId, lease: LeaseId) -> Self {
        Self {
            shared,
            id,
            lease,
            throttle: ProgressThrottle::new(),
        }
    }
}

#[async_trait]
impl TransferSink for LeaseSink {
    async fn on_started(&mut self, total: u64) -> bool {
        let mut state = self.shared.state.lock().await;
        if !state.owns(&self.id, self.lease) {
            return false;
        }
        if let Some(download) = state.registry.get_mut(&self.id) {
            download.total_size = total;
        }
        true
    }

    async fn on_chunk(&mut self, len: u64) -> bool {
        let snapshot = {
            let mut state = self.shared.state.lock().await;
            if !state.owns(&self.id, self.lease) {
                return false;
            }
            let Some(download) = state.registry.get_mut(&self.id) else {
                return false;
            };
            download.record_bytes(len);
            let progress = download.progress;
            self.throttle
                .should_emit(progress)
                .then(|| state.snapshot())
        };

        if let Some(snapshot) = snapshot {
            self.shared.observer.on_snapshot(&snapshot);
        }
        true
    }
}

#[async_trait]
impl DownloadManagerPort for DownloadManagerImpl {
    async fn add(&self, url: &str, filename: &str) -> Download {
        let (download, snapshot, admissions) = {
            let mut state = self.shared.state.lock().await;
            let ManagerState {
                registry,
                path_claims,
                ..
            } = &mut *state;
            let download = registry.add(url, filename, |path| path_claims.contains_key(path));
            state.scheduler.enqueue(download.id);
            let admissions = self.shared.admit(&mut state);
            (download, state.snapshot(), admissions)
        };

        tracing::info!(
            target: "edudl.download",
            id = %download.id,
            url = %download.url,
            path = %download.local_path.display(),
            "Queued download"
        );

        self.shared.spawn_all(admissions);
        self.shared.observer.on_snapshot(&snapshot);
        download
    }

    async fn get(&self, id: &DownloadId) -> Option<Download> {
        self.shared.state.lock().await.registry.get(id).cloned()
    }

    async fn list(&self) -> Vec<Download> {
        self.shared.state.lock().await.registry.list()
    }

    async fn pause(&self, id: &DownloadId) -> bool {
        let snapshot = {
            let mut state = self.shared.state.lock().await;
            let Some(download) = state.registry.get_mut(id) else {
                return false;
            };
            if download.status != DownloadStatus::Downloading {
                return false;
            }
            download.status = DownloadStatus::Pending;
            if let Some(active) = state.leases.remove(id) {
                active.cancel.cancel();
            }
            state.snapshot()
        };

        tracing::info!(target: "edudl.download", id = %id, "Paused download");
        self.shared.observer.on_snapshot(&snapshot);
        true
    }

    async fn resume(&self, id: &DownloadId) -> bool {
        let (snapshot, admissions) = {
            let mut state = self.shared.state.lock().await;
            match state.registry.get(id) {
                Some(download) if download.status == DownloadStatus::Pending => {}
                _ => return false,
            }
            state.scheduler.enqueue(*id);
            let admissions = self.shared.admit(&mut state);
            (state.snapshot(), admissions)
        };

        tracing::info!(target: "edudl.download", id = %id, "Resumed download");
        self.shared.spawn_all(admissions);
        self.shared.observer.on_snapshot(&snapshot);
        true
    }

    async fn cancel(&self, id: &DownloadId) -> bool {
        let snapshot = {
            let mut state = self.shared.state.lock().await;
            let Some(download) = state.registry.get_mut(id) else {
                return false;
            };
            download.status = DownloadStatus::Cancelled;
            download.completed_at = Some(Utc::now());
            download.error = None;
            let local_path = download.local_path.clone();

            state.scheduler.dequeue_pending(id);
            if let Some(active) = state.leases.remove(id) {
                active.cancel.cancel();
            }
            // A live worker deletes the file in its own cleanup.
            if !state.path_claims.contains_key(&local_path) {
                remove_file_best_effort(&local_path).await;
            }
            state.snapshot()
        };

        tracing::info!(target: "edudl.download", id = %id, "Cancelled download");
        self.shared.observer.on_snapshot(&snapshot);
        true
    }

    async fn clear_completed(&self) -> usize {
        let (removed, snapshot) = {
            let mut state = self.shared.state.lock().await;
            let removed = state.registry.remove_terminal();
            if removed == 0 {
                return 0;
            }
            (removed, state.snapshot())
        };

        tracing::info!(target: "edudl.download", removed = removed, "Cleared finished downloads");
        self.shared.observer.on_snapshot(&snapshot);
        removed
    }

    async fn snapshot(&self) -> DownloadsSnapshot {
        self.shared.state.lock().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use edudl_core::ports::{NoopObserver, TransportResponse};

    use super::*;

    struct UnusedTransport;

    #[async_trait]
    impl TransportPort for UnusedTransport {
        async fn get(&self, url: &str) -> Result<TransportResponse, DownloadError> {
            Err(DownloadError::network(format!("unexpected request for {url}")))
        }
    }

    fn state() -> ManagerState {
        ManagerState {
            registry: DownloadRegistry::new(PathBuf::from("/tmp/edudl")),
            scheduler: Scheduler::new(2),
            leases: HashMap::new(),
            path_claims: HashMap::new(),
            seq: 0,
            shutting_down: false,
        }
    }

    #[test]
    fn lease_id_equality() {
        let l1 = LeaseId(1);
        let l2 = LeaseId(1);
        let l3 = LeaseId(2);

        assert_eq!(l1, l2);
        assert_ne!(l1, l3);
    }

    #[test]
    fn ownership_requires_matching_lease() {
        let mut state = state();
        let id = DownloadId::generate();
        state.leases.insert(
            id,
            ActiveLease {
                lease: LeaseId(7),
                cancel: CancellationToken::new(),
            },
        );

        assert!(state.owns(&id, LeaseId(7)));
        assert!(!state.owns(&id, LeaseId(6)));
        assert!(!state.owns(&DownloadId::generate(), LeaseId(7)));
    }

    #[test]
    fn path_claim_lasts_until_last_worker_releases() {
        let mut state = state();
        let path = PathBuf::from("/tmp/edudl/a.bin");

        let stale = state.claim_path(&path);
        let fresh = state.claim_path(&path);
        assert!(Arc::ptr_eq(&stale, &fresh));

        state.release_path(&path);
        assert!(state.path_claims.contains_key(&path));
        state.release_path(&path);
        assert!(state.path_claims.is_empty());
    }

    #[test]
    fn snapshot_seq_increases() {
        let mut state = state();
        let first = state.snapshot();
        let second = state.snapshot();
        assert!(second.seq > first.seq);
        assert_eq!(second.active_count, 0);
    }

    #[test]
    fn fresh_manager_is_idle() {
        let manager = build_download_manager(DownloadManagerDeps {
            transport: Arc::new(UnusedTransport),
            observer: Arc::new(NoopObserver::new()),
            config: DownloadManagerConfig::new(PathBuf::from("/tmp/edudl")),
        })
        .unwrap();

        let snapshot = tokio_test::block_on(manager.snapshot());
        assert!(snapshot.downloads.is_empty());
        assert!(snapshot.is_idle());
        assert_eq!(tokio_test::block_on(manager.active_count()), 0);
    }

    #[test]
    fn apply_outcome_success_sets_full_progress() {
        let mut download = Download::new(
            DownloadId::generate(),
            "u",
            "f",
            PathBuf::from("/tmp/f"),
        );
        download.status = DownloadStatus::Downloading;

        apply_outcome(
            &mut download,
            &Ok(CompletedTransfer {
                downloaded: 10,
                total: 10,
            }),
        );

        assert_eq!(download.status, DownloadStatus::Completed);
        assert!((download.progress - 100.0).abs() < f64::EPSILON);
        assert_eq!(download.downloaded_size, 10);
        assert!(download.completed_at.is_some());
    }

    #[test]
    fn apply_outcome_failure_records_message() {
        let mut download = Download::new(
            DownloadId::generate(),
            "u",
            "f",
            PathBuf::from("/tmp/f"),
        );
        download.status = DownloadStatus::Downloading;

        apply_outcome(&mut download, &Err(DownloadError::network_with_status("Not Found", 404)));

        assert_eq!(download.status, DownloadStatus::Failed);
        assert_eq!(download.error.as_deref(), Some("Network error: Not Found"));
    }
}
