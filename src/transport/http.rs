//! HTTP transport for bridge stream connections.

use std::time::Duration;

use async_trait::async_trait;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::Client;
use thiserror::Error;

use crate::config::TransportConfig;
use crate::transport::StreamRequest;

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The endpoint rejected the request.
    #[error("HTTP {status}: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body text, if any.
        body: String,
    },
    /// The request or connection timed out.
    #[error("Request timed out")]
    Timeout,
    /// The request could not be sent.
    #[error("Request failed: {0}")]
    Request(String),
    /// The streaming body failed mid-read.
    #[error("Stream read failed: {0}")]
    Read(String),
}

/// Byte-chunk stream produced by a transport.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Abstraction over how stream bytes are obtained.
///
/// The engine only ever sees this trait, so tests drive it with scripted
/// chunk sequences and no network.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a stream for the request.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if the stream could not be opened;
    /// failures after opening travel inside the returned stream.
    async fn open(&self, request: &StreamRequest) -> Result<ChunkStream, TransportError>;
}

/// Build an HTTP client for streaming.
///
/// Only the connect phase gets a deadline; response bodies stay open for
/// the lifetime of the CLI session.
fn build_http_client(connect_timeout: Duration) -> Client {
    Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .expect("Failed to build HTTP client")
}

/// Transport that POSTs to a bridge endpoint and streams the response body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: build_http_client(CONNECT_TIMEOUT),
            endpoint: endpoint.into(),
        }
    }

    /// Create a transport from configuration.
    #[must_use]
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            client: build_http_client(Duration::from_secs(config.connect_timeout_secs)),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Get the configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(&self, request: &StreamRequest) -> Result<ChunkStream, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| match chunk {
                Ok(bytes) => Ok(bytes.to_vec()),
                Err(e) if e.is_timeout() => Err(TransportError::Timeout),
                Err(e) => Err(TransportError::Read(e.to_string())),
            })
            .boxed();
        Ok(stream)
    }
}
