//! Shared test helpers for assistant tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wardrobe_providers::gateway::{GatewaySettings, InferenceGateway};
use wardrobe_providers::transport::{HttpReply, InferenceTransport, TransportError};

/// A transport that returns a sequence of scripted replies.
///
/// Each call to `post_json` returns the next reply in the queue and records
/// the request body. Panics if more calls are made than replies provided.
pub struct SequentialMockTransport {
    replies: Mutex<Vec<Result<HttpReply, TransportError>>>,
    bodies: Mutex<Vec<serde_json::Value>>,
}

impl SequentialMockTransport {
    pub fn new(replies: Vec<Result<HttpReply, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            bodies: Mutex::new(Vec::new()),
        }
    }

    /// A transport whose single reply carries `text` as the first candidate.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(text_reply(text))])
    }

    pub fn call_count(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }

    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceTransport for SequentialMockTransport {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn post_json(
        &self,
        _url: &str,
        _api_key: &str,
        body: &serde_json::Value,
    ) -> Result<HttpReply, TransportError> {
        let mut bodies = self.bodies.lock().unwrap();
        bodies.push(body.clone());
        match self.replies.lock().unwrap().pop() {
            Some(reply) => reply,
            None => panic!(
                "SequentialMockTransport: no more replies (call #{})",
                bodies.len()
            ),
        }
    }
}

/// A 200 reply wrapping `text` in the provider envelope.
pub fn text_reply(text: &str) -> HttpReply {
    HttpReply::new(
        200,
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
        .to_string(),
    )
}

/// Gateway settings with a key and a short backoff.
pub fn test_settings() -> GatewaySettings {
    GatewaySettings {
        api_url: "https://example.test".into(),
        model: "gemini-test".into(),
        api_key: "test-key".into(),
        max_retries: 2,
        backoff_base: Duration::from_millis(10),
        fail_fast_on_client_error: false,
    }
}

pub fn gateway_with(transport: Arc<SequentialMockTransport>) -> InferenceGateway {
    InferenceGateway::new(test_settings(), transport)
}
