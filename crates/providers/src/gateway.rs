//! External inference gateway — bounded retry with exponential backoff.
//!
//! One call is one attempt loop: the request body is encoded once and
//! resent unchanged on every attempt. Transport errors and non-2xx
//! statuses are retried after `backoff_base * 2^attempt`; once attempts
//! are exhausted the call ends in `ExternalServiceUnavailable`. A 2xx body
//! is unwrapped to the first candidate's text or `EmptyResponse`.
//!
//! Nothing here ever panics or raises across the boundary: every outcome
//! is a `Result<String, Failure>`.

use crate::gemini;
use crate::transport::{InferenceTransport, ReqwestTransport, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use wardrobe_config::AppConfig;
use wardrobe_core::cancel::CancellationToken;
use wardrobe_core::error::Failure;
use wardrobe_core::inference::{CallPhase, InferenceRequest};

/// Endpoint, credential, and retry policy for one gateway.
#[derive(Clone)]
pub struct GatewaySettings {
    pub api_url: String,
    pub model: String,
    pub api_key: String,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_base: Duration,
    /// Stop on 4xx statuses other than 408/429 instead of retrying.
    pub fail_fast_on_client_error: bool,
}

impl GatewaySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            api_url: config.inference.api_url.trim_end_matches('/').to_string(),
            model: config.inference.model.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            max_retries: config.inference.max_retries,
            backoff_base: Duration::from_millis(config.inference.backoff_base_ms),
            fail_fast_on_client_error: config.inference.fail_fast_on_client_error,
        }
    }

    /// `generateContent` URL for the configured model. Carries no credential.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl std::fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field(
                "api_key",
                &if self.api_key.is_empty() { "None" } else { "[REDACTED]" },
            )
            .field("max_retries", &self.max_retries)
            .field("backoff_base", &self.backoff_base)
            .field("fail_fast_on_client_error", &self.fail_fast_on_client_error)
            .finish()
    }
}

/// Sends [`InferenceRequest`]s to the provider.
pub struct InferenceGateway {
    settings: GatewaySettings,
    transport: Arc<dyn InferenceTransport>,
}

impl InferenceGateway {
    pub fn new(settings: GatewaySettings, transport: Arc<dyn InferenceTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Build a gateway with the production `reqwest` transport.
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(Duration::from_secs(
            config.inference.request_timeout_secs,
        ))?;
        info!(
            model = %config.inference.model,
            max_retries = config.inference.max_retries,
            "Inference gateway configured"
        );
        Ok(Self::new(
            GatewaySettings::from_config(config),
            Arc::new(transport),
        ))
    }

    /// Delay inserted after failed attempt `attempt` (0-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.settings.backoff_base.saturating_mul(factor)
    }

    /// Send a request and return the provider's text.
    pub async fn send(&self, request: &InferenceRequest) -> Result<String, Failure> {
        self.send_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Send a request, giving up early once `cancel` fires.
    pub async fn send_with_cancel(
        &self,
        request: &InferenceRequest,
        cancel: &CancellationToken,
    ) -> Result<String, Failure> {
        let api_key = self.settings.api_key.trim();
        if api_key.is_empty() {
            warn!("Inference call rejected: no API key configured");
            return Err(Failure::configuration_missing(
                "no inference API key configured (set WARDROBE_API_KEY or GEMINI_API_KEY)",
            ));
        }

        if cancel.is_cancelled() {
            return Err(Failure::cancelled());
        }

        let body = serde_json::to_value(gemini::encode(request))
            .map_err(|e| Failure::unavailable(format!("failed to encode request: {e}")))?;
        let url = self.settings.endpoint();
        let max_retries = self.settings.max_retries;
        let mut last_error = String::from("no attempt made");

        for attempt in 0..=max_retries {
            debug!(
                phase = ?CallPhase::Sending,
                attempt,
                max_retries,
                images = request.images().len(),
                "Sending inference request"
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(attempt, "Inference call cancelled");
                    return Err(Failure::cancelled());
                }
                outcome = self.transport.post_json(&url, api_key, &body) => outcome,
            };

            match outcome {
                Ok(reply) if reply.is_success() => {
                    debug!(attempt, status = reply.status, "Inference request succeeded");
                    return gemini::extract_text(&reply.body);
                }
                Ok(reply) => {
                    warn!(
                        status = reply.status,
                        attempt,
                        max_retries,
                        "Inference endpoint returned an error status"
                    );
                    if self.settings.fail_fast_on_client_error && is_non_retryable(reply.status) {
                        return Err(Failure::unavailable(format!(
                            "inference request rejected with HTTP {}",
                            reply.status
                        )));
                    }
                    last_error = format!("HTTP {}", reply.status);
                }
                Err(e) => {
                    warn!(error = %e, attempt, max_retries, "Inference transport failed");
                    last_error = e.to_string();
                }
            }

            if attempt < max_retries {
                let delay = self.backoff_delay(attempt);
                debug!(
                    phase = ?CallPhase::Retrying,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before retry"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        info!(attempt, "Inference call cancelled during backoff");
                        return Err(Failure::cancelled());
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(Failure::unavailable(format!(
            "inference endpoint unavailable after {} attempts: {last_error}",
            max_retries + 1
        )))
    }
}

/// Client errors that a resend cannot fix. 408 and 429 stay retryable.
fn is_non_retryable(status: u16) -> bool {
    (400..500).contains(&status) && status != 408 && status != 429
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpReply;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wardrobe_core::error::FailureKind;
    use wardrobe_core::inference::ImagePayload;

    /// A transport that replays scripted outcomes and records every body.
    struct ScriptedTransport {
        script: Mutex<Vec<Result<HttpReply, TransportError>>>,
        fallback: Result<HttpReply, TransportError>,
        bodies: Mutex<Vec<serde_json::Value>>,
        keys: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(
            script: Vec<Result<HttpReply, TransportError>>,
            fallback: Result<HttpReply, TransportError>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into_iter().rev().collect()),
                fallback,
                bodies: Mutex::new(Vec::new()),
                keys: Mutex::new(Vec::new()),
            }
        }

        fn always(outcome: Result<HttpReply, TransportError>) -> Self {
            Self::new(vec![], outcome)
        }

        fn attempts(&self) -> usize {
            self.bodies.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl InferenceTransport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn post_json(
            &self,
            _url: &str,
            api_key: &str,
            body: &serde_json::Value,
        ) -> Result<HttpReply, TransportError> {
            self.bodies.lock().unwrap().push(body.clone());
            self.keys.lock().unwrap().push(api_key.to_string());
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    /// A transport that never answers.
    struct HangingTransport;

    #[async_trait]
    impl InferenceTransport for HangingTransport {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn post_json(
            &self,
            _url: &str,
            _api_key: &str,
            _body: &serde_json::Value,
        ) -> Result<HttpReply, TransportError> {
            std::future::pending().await
        }
    }

    fn ok_text(text: &str) -> Result<HttpReply, TransportError> {
        Ok(HttpReply::new(
            200,
            serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": text}]}}]
            })
            .to_string(),
        ))
    }

    fn settings(max_retries: u32) -> GatewaySettings {
        GatewaySettings {
            api_url: "https://example.test".into(),
            model: "gemini-test".into(),
            api_key: "secret-key".into(),
            max_retries,
            backoff_base: Duration::from_secs(1),
            fail_fast_on_client_error: false,
        }
    }

    fn gateway(settings: GatewaySettings, transport: Arc<ScriptedTransport>) -> InferenceGateway {
        InferenceGateway::new(settings, transport)
    }

    #[test]
    fn endpoint_has_no_credential() {
        let s = settings(5);
        let url = s.endpoint();
        assert_eq!(
            url,
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
        assert!(!url.contains("secret-key"));
        assert!(!format!("{s:?}").contains("secret-key"));
    }

    #[test]
    fn backoff_doubles_from_base() {
        let transport = Arc::new(ScriptedTransport::always(ok_text("x")));
        let gw = gateway(settings(5), transport);
        assert_eq!(gw.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(gw.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(gw.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(gw.backoff_delay(4), Duration::from_secs(16));
    }

    #[tokio::test]
    async fn first_attempt_success() {
        let transport = Arc::new(ScriptedTransport::always(ok_text("hello")));
        let gw = gateway(settings(5), transport.clone());
        let text = gw.send(&InferenceRequest::new("hi")).await.unwrap();
        assert_eq!(text, "hello");
        assert_eq!(transport.attempts(), 1);
        assert_eq!(transport.keys.lock().unwrap()[0], "secret-key");
    }

    #[tokio::test(start_paused = true)]
    async fn retry_bound_and_total_backoff() {
        let transport = Arc::new(ScriptedTransport::always(Err(TransportError::Network(
            "connection refused".into(),
        ))));
        let gw = gateway(settings(3), transport.clone());

        let start = tokio::time::Instant::now();
        let err = gw.send(&InferenceRequest::new("hi")).await.unwrap_err();

        assert_eq!(err.kind, FailureKind::ExternalServiceUnavailable);
        assert!(err.message.contains("4 attempts"));
        assert!(err.message.contains("connection refused"));
        assert_eq!(transport.attempts(), 4);
        assert!(start.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let transport = Arc::new(ScriptedTransport::new(
            vec![
                Ok(HttpReply::new(503, "unavailable")),
                Err(TransportError::Timeout),
            ],
            ok_text("finally"),
        ));
        let gw = gateway(settings(5), transport.clone());

        let start = tokio::time::Instant::now();
        let text = gw.send(&InferenceRequest::new("hi")).await.unwrap();
        assert_eq!(text, "finally");
        assert_eq!(transport.attempts(), 3);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_resend_identical_body() {
        let transport = Arc::new(ScriptedTransport::new(
            vec![Ok(HttpReply::new(500, "")), Ok(HttpReply::new(502, ""))],
            ok_text("done"),
        ));
        let gw = gateway(settings(5), transport.clone());
        let request = InferenceRequest::new("classify")
            .with_images(vec![ImagePayload::new("image/png", vec![9, 9, 9])])
            .with_system_preamble("be brief");

        gw.send(&request).await.unwrap();

        let bodies = transport.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 3);
        assert!(bodies.iter().all(|b| b == &bodies[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_retry_uniformly_by_default() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpReply::new(400, "bad"))));
        let gw = gateway(settings(2), transport.clone());
        let err = gw.send(&InferenceRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ExternalServiceUnavailable);
        assert_eq!(transport.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_stops_on_client_error() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpReply::new(400, "bad"))));
        let mut s = settings(5);
        s.fail_fast_on_client_error = true;
        let gw = gateway(s, transport.clone());
        let err = gw.send(&InferenceRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ExternalServiceUnavailable);
        assert!(err.message.contains("400"));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_still_retries_rate_limits() {
        let transport = Arc::new(ScriptedTransport::new(
            vec![Ok(HttpReply::new(429, "slow down"))],
            ok_text("ok"),
        ));
        let mut s = settings(5);
        s.fail_fast_on_client_error = true;
        let gw = gateway(s, transport.clone());
        assert_eq!(gw.send(&InferenceRequest::new("hi")).await.unwrap(), "ok");
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn empty_candidates_is_empty_response() {
        let transport = Arc::new(ScriptedTransport::always(Ok(HttpReply::new(
            200,
            r#"{"candidates": []}"#,
        ))));
        let gw = gateway(settings(5), transport.clone());
        let err = gw.send(&InferenceRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::EmptyResponse);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn missing_credential_makes_no_attempt() {
        let transport = Arc::new(ScriptedTransport::always(ok_text("never")));
        let mut s = settings(5);
        s.api_key = String::new();
        let gw = gateway(s, transport.clone());
        let err = gw.send(&InferenceRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ConfigurationMissing);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn whitespace_credential_counts_as_missing() {
        let transport = Arc::new(ScriptedTransport::always(ok_text("never")));
        let mut s = settings(5);
        s.api_key = "   ".into();
        let gw = gateway(s, transport.clone());
        let err = gw.send(&InferenceRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::ConfigurationMissing);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn already_cancelled_makes_no_attempt() {
        let transport = Arc::new(ScriptedTransport::always(ok_text("never")));
        let gw = gateway(settings(5), transport.clone());
        let token = CancellationToken::new();
        token.cancel();
        let err = gw
            .send_with_cancel(&InferenceRequest::new("hi"), &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Cancelled);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_attempt() {
        let gw = InferenceGateway::new(settings(5), Arc::new(HangingTransport));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let err = tokio::time::timeout(
            Duration::from_secs(2),
            gw.send_with_cancel(&InferenceRequest::new("hi"), &token),
        )
        .await
        .expect("cancellation should end the call")
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_backoff() {
        let transport = Arc::new(ScriptedTransport::always(Err(TransportError::Timeout)));
        let mut s = settings(5);
        s.backoff_base = Duration::from_secs(60);
        let gw = gateway(s, transport.clone());
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            canceller.cancel();
        });
        let err = gw
            .send_with_cancel(&InferenceRequest::new("hi"), &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Cancelled);
        assert_eq!(transport.attempts(), 1);
    }

    #[test]
    fn non_retryable_statuses() {
        assert!(is_non_retryable(400));
        assert!(is_non_retryable(403));
        assert!(!is_non_retryable(408));
        assert!(!is_non_retryable(429));
        assert!(!is_non_retryable(500));
    }
}
