//! Network transport port.
//!
//! The download worker only needs a streaming GET with access to the
//! advertised content length. Keeping that behind a trait lets the worker
//! run against an in-memory transport in tests.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::download::DownloadError;

/// Body stream of a response: chunks in arrival order, ending on the first error.
pub type BodyStream = BoxStream<'static, Result<Bytes, DownloadError>>;

/// A response whose headers have arrived and whose body is still streaming.
pub struct TransportResponse {
    /// Value of the `Content-Length` header, if the server sent one.
    pub content_length: Option<u64>,
    /// Response body.
    pub body: BodyStream,
}

impl TransportResponse {
    /// Wrap a body stream.
    pub fn new(content_length: Option<u64>, body: BodyStream) -> Self {
        Self {
            content_length,
            body,
        }
    }
}

impl fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportResponse")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Port for fetching a URL as a byte stream.
///
/// Implementations must map non-success HTTP statuses to
/// `DownloadError::Network` with the status code set.
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Issue a GET for `url` and return once headers are available.
    async fn get(&self, url: &str) -> Result<TransportResponse, DownloadError>;
}
