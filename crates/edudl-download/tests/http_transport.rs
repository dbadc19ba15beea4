//! `ReqwestTransport` against a loopback axum server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::StatusCode;
use axum::routing::get;
use bytes::Bytes;
use edudl_download::{
    DownloadError, DownloadManagerConfig, DownloadManagerDeps, DownloadManagerPort,
    DownloadStatus, ReqwestTransport, TransportPort, TransportResponse, WatchObserver,
    build_download_manager,
};
use futures_util::{StreamExt, stream};

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/fixed.txt", get(|| async { "course notes" }))
        .route(
            "/streamed.bin",
            get(|| async {
                let parts = vec![
                    Ok::<_, std::io::Error>(Bytes::from_static(b"part1-")),
                    Ok(Bytes::from_static(b"part2")),
                ];
                Body::from_stream(stream::iter(parts))
            }),
        )
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(5), "edudl-test").unwrap()
}

async fn read_body(response: TransportResponse) -> Vec<u8> {
    let chunks: Vec<Bytes> = response
        .body
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;
    chunks.concat()
}

#[tokio::test]
async fn fixed_body_reports_content_length() {
    let base = spawn_server().await;
    let response = transport().get(&format!("{base}/fixed.txt")).await.unwrap();

    assert_eq!(response.content_length, Some(12));
    assert_eq!(read_body(response).await, b"course notes");
}

#[tokio::test]
async fn chunked_body_has_no_content_length() {
    let base = spawn_server().await;
    let response = transport()
        .get(&format!("{base}/streamed.bin"))
        .await
        .unwrap();

    assert_eq!(response.content_length, None);
    assert_eq!(read_body(response).await, b"part1-part2");
}

#[tokio::test]
async fn error_status_maps_to_network_error() {
    let base = spawn_server().await;
    let err = transport()
        .get(&format!("{base}/missing"))
        .await
        .unwrap_err();

    match err {
        DownloadError::Network { status_code, .. } => assert_eq!(status_code, Some(404)),
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn manager_downloads_over_http() {
    let base = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let config = DownloadManagerConfig::new(dir.path().join("materials"));
    let observer = Arc::new(WatchObserver::new());
    let mut rx = observer.subscribe();

    let manager = build_download_manager(DownloadManagerDeps {
        transport: Arc::new(ReqwestTransport::from_config(&config).unwrap()),
        observer: Arc::clone(&observer),
        config,
    })
    .unwrap();

    let fixed = manager
        .add(&format!("{base}/fixed.txt"), "fixed.txt")
        .await;
    let streamed = manager
        .add(&format!("{base}/streamed.bin"), "streamed.bin")
        .await;
    let missing = manager.add(&format!("{base}/missing"), "missing.pdf").await;

    let snapshot = tokio::time::timeout(
        Duration::from_secs(10),
        rx.wait_for(|s| s.downloads.len() == 3 && s.all_terminal()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.status_of(&fixed.id), Some(DownloadStatus::Completed));
    assert_eq!(snapshot.status_of(&streamed.id), Some(DownloadStatus::Completed));
    assert_eq!(snapshot.status_of(&missing.id), Some(DownloadStatus::Failed));
    assert!(snapshot.get(&missing.id).unwrap().error.as_deref().unwrap().contains("404"));

    assert_eq!(std::fs::read(&fixed.local_path).unwrap(), b"course notes");
    assert_eq!(std::fs::read(&streamed.local_path).unwrap(), b"part1-part2");
    assert!(!missing.local_path.exists());
}
