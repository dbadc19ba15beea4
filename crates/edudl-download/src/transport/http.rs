//! HTTP transport backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;

use edudl_core::download::DownloadError;
use edudl_core::ports::{DownloadManagerConfig, TransportPort, TransportResponse};

/// Streaming GET over a shared `reqwest::Client`.
///
/// Non-success statuses are reported as `DownloadError::Network` carrying
/// the status code; the body is never read in that case.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with the given connect timeout and user agent.
    pub fn new(connect_timeout: Duration, user_agent: &str) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DownloadError::other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Build a client from the manager configuration.
    pub fn from_config(config: &DownloadManagerConfig) -> Result<Self, DownloadError> {
        Self::new(config.connect_timeout, &config.user_agent)
    }
}

#[async_trait]
impl TransportPort for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, DownloadError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::network_with_status(
                format!("server answered {status}"),
                status.as_u16(),
            ));
        }

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(map_reqwest_error))
            .boxed();

        tracing::debug!(url = %url, content_length = ?content_length, "Response headers received");
        Ok(TransportResponse::new(content_length, body))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    match err.status() {
        Some(status) => DownloadError::network_with_status(err.to_string(), status.as_u16()),
        None => DownloadError::network(err.to_string()),
    }
}
