//! Transfer worker pipeline.
//!
//! This module contains the byte-moving part of a download, isolated from
//! the manager's registry and scheduler. The worker operates on a value-type
//! `DownloadJob` and cloned `Arc` dependencies and reports through a
//! `TransferSink`; it never touches the manager's state directly.
//!
//! # Design Principles
//!
//! - Worker receives a `DownloadJob` (value type) and `WorkerDeps` (cloned Arcs)
//! - Every state change goes through the sink, which may refuse it
//! - Cancellation is handled via `tokio::select!` around the whole pipeline
//! - Partial files are left for the manager to delete

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use edudl_core::download::{DownloadError, DownloadId};
use edudl_core::ports::TransportPort;

use super::paths::ensure_parent_dir;

/// Dependencies for the transfer worker.
#[derive(Clone)]
pub struct WorkerDeps {
    /// Network transport.
    pub transport: Arc<dyn TransportPort>,
    /// Fail when no chunk arrives within this window.
    pub idle_timeout: Option<Duration>,
}

/// A transfer to be executed by the worker.
///
/// Contains everything needed to run the transfer, with no references
/// back to the manager.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// The download ID.
    pub id: DownloadId,
    /// Source URL.
    pub url: String,
    /// Destination file.
    pub local_path: PathBuf,
    /// Cancellation token for this job.
    pub cancel: CancellationToken,
}

/// Byte counts of a transfer that reached end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedTransfer {
    /// Bytes written.
    pub downloaded: u64,
    /// Advertised size, 0 if unknown.
    pub total: u64,
}

/// Receiver of worker progress.
///
/// Each call returns whether the job still owns its download. On `false`
/// the worker stops and reports `DownloadError::Cancelled`.
#[async_trait]
pub trait TransferSink: Send {
    /// Headers arrived; `total` is the content length or 0.
    async fn on_started(&mut self, total: u64) -> bool;

    /// `len` more bytes were written to disk.
    async fn on_chunk(&mut self, len: u64) -> bool;
}

/// Run a transfer job to completion.
///
/// Streams the body of `job.url` into `job.local_path` (truncating any
/// previous content), reporting through `sink`.
///
/// # Cancellation
///
/// When `job.cancel` fires or the sink reports lost ownership, this
/// returns `Err(DownloadError::Cancelled)`.
pub async fn run_job<S>(
    job: &DownloadJob,
    deps: &WorkerDeps,
    sink: &mut S,
) -> Result<CompletedTransfer, DownloadError>
where
    S: TransferSink + ?Sized,
{
    tokio::select! {
        biased;

        () = job.cancel.cancelled() => {
            Err(DownloadError::Cancelled)
        }

        result = execute_transfer(job, deps, sink) => result,
    }
}

async fn execute_transfer<S>(
    job: &DownloadJob,
    deps: &WorkerDeps,
    sink: &mut S,
) -> Result<CompletedTransfer, DownloadError>
where
    S: TransferSink + ?Sized,
{
    let response = within_idle(deps.idle_timeout, deps.transport.get(&job.url)).await??;
    let total = response.content_length.unwrap_or(0);
    if !sink.on_started(total).await {
        return Err(DownloadError::Cancelled);
    }

    ensure_parent_dir(&job.local_path).await?;
    let mut file = File::create(&job.local_path)
        .await
        .map_err(|e| DownloadError::from_io_error(&e))?;

    let mut body = response.body;
    let mut downloaded: u64 = 0;
    while let Some(chunk) = within_idle(deps.idle_timeout, body.next()).await? {
        let chunk = chunk?;
        let len = chunk.len() as u64;
        if total > 0 && downloaded + len > total {
            return Err(DownloadError::network(format!(
                "server sent more than the advertised {total} bytes"
            )));
        }

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::from_io_error(&e))?;
        downloaded += len;

        if !sink.on_chunk(len).await {
            return Err(DownloadError::Cancelled);
        }
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::from_io_error(&e))?;

    if total > 0 && downloaded < total {
        return Err(DownloadError::network(format!(
            "connection closed after {downloaded} of {total} bytes"
        )));
    }

    tracing::debug!(id = %job.id, bytes = downloaded, "Transfer stream finished");
    Ok(CompletedTransfer { downloaded, total })
}

/// Await `fut`, failing with `DownloadError::Timeout` if `limit` elapses first.
async fn within_idle<F: Future>(
    limit: Option<Duration>,
    fut: F,
) -> Result<F::Output, DownloadError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DownloadError::timeout(limit.as_secs())),
        None => Ok(fut.await),
    }
}
