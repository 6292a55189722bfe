//! HTTP transport seam for the inference gateway.
//!
//! The gateway owns retry policy and response interpretation; a transport
//! only moves one JSON body to one URL and reports what came back. Tests
//! swap in scripted transports to count attempts without a network.

use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

/// Header carrying the Gemini API key. Keeps the credential out of URLs.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Raw HTTP outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP status level.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// A human-readable name for this transport.
    fn name(&self) -> &str;

    /// POST `body` as JSON to `url`, authenticating with `api_key`.
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, TransportError>;
}

/// Production transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl InferenceTransport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, TransportError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify_reqwest_error)?;
        trace!(status, bytes = body.len(), "Inference transport received response");
        Ok(HttpReply { status, body })
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e.without_url().to_string())
    }
}
