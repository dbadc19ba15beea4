//! Shared helpers for download manager integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use edudl_download::{
    DownloadError, DownloadManagerConfig, DownloadManagerDeps, DownloadManagerImpl,
    DownloadsSnapshot, TransportPort, TransportResponse, WatchObserver, build_download_manager,
};
use futures_util::StreamExt;
use futures_util::stream;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

type Chunk = Result<Bytes, DownloadError>;

/// One scripted response: headers plus a body fed by the test.
struct ScriptedResponse {
    content_length: Option<u64>,
    body: mpsc::UnboundedReceiver<Chunk>,
}

/// In-memory transport whose responses are driven chunk by chunk by the test.
///
/// Each `script` call queues one response for a URL; every `get` consumes
/// the oldest queued response. A `get` with nothing queued fails.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<ScriptedResponse>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url` and return the handle that feeds its body.
    pub fn script(&self, url: &str, content_length: Option<u64>) -> BodyFeeder {
        let (tx, rx) = mpsc::unbounded_channel();
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(ScriptedResponse {
                content_length,
                body: rx,
            });
        BodyFeeder { tx: Some(tx) }
    }

    /// Queue a response whose whole body is already available.
    pub fn serve(&self, url: &str, body: &'static [u8]) {
        let mut feeder = self.script(url, Some(body.len() as u64));
        feeder.send(body);
        feeder.finish();
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportPort for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, DownloadError> {
        self.requests.lock().unwrap().push(url.to_string());
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| DownloadError::network_with_status("no scripted response", 404))?;

        let body = stream::unfold(scripted.body, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })
        .boxed();
        Ok(TransportResponse::new(scripted.content_length, body))
    }
}

/// Test-side end of a scripted body.
pub struct BodyFeeder {
    tx: Option<mpsc::UnboundedSender<Chunk>>,
}

impl BodyFeeder {
    /// Deliver a chunk.
    pub fn send(&mut self, bytes: &'static [u8]) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Ok(Bytes::from_static(bytes)));
        }
    }

    /// Deliver an error; the stream ends after it is read.
    pub fn fail(&mut self, error: DownloadError) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Err(error));
        }
    }

    /// End the body.
    pub fn finish(&mut self) {
        self.tx = None;
    }
}

/// A manager wired to a scripted transport and a watch observer.
pub struct Harness {
    pub manager: DownloadManagerImpl,
    pub transport: Arc<ScriptedTransport>,
    pub observer: Arc<WatchObserver>,
    pub snapshots: watch::Receiver<DownloadsSnapshot>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(max_concurrent: u32) -> Self {
        Self::build(max_concurrent, Some(Duration::from_secs(10)))
    }

    pub fn build(max_concurrent: u32, idle_timeout: Option<Duration>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let observer = Arc::new(WatchObserver::new());
        let snapshots = observer.subscribe();

        let config = DownloadManagerConfig::new(dir.path().to_path_buf())
            .with_max_concurrent(max_concurrent)
            .with_idle_timeout(idle_timeout);
        let manager = build_download_manager(DownloadManagerDeps {
            transport: Arc::clone(&transport),
            observer: Arc::clone(&observer),
            config,
        })
        .unwrap();

        Self {
            manager,
            transport,
            observer,
            snapshots,
            dir,
        }
    }

    /// Wait until a published snapshot satisfies `pred`.
    pub async fn wait_until<F>(&mut self, pred: F) -> DownloadsSnapshot
    where
        F: FnMut(&DownloadsSnapshot) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), self.snapshots.wait_for(pred))
            .await
            .expect("timed out waiting for snapshot")
            .expect("observer dropped")
            .clone()
    }
}
