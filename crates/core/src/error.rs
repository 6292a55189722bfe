//! Error types for the wardrobe domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; inference calls report
//! a [`Failure`] value instead of raising.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The top-level error type for wardrobe operations outside the inference path.
#[derive(Debug, Error)]
pub enum Error {
    // --- Inference failures ---
    #[error("Inference failed: {0}")]
    Inference(#[from] Failure),

    // --- Weather errors ---
    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    // --- Storage errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Image input errors ---
    #[error("Image error: {0}")]
    Image(#[from] ImageError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable, inspectable classification of an inference failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Required credential absent; no network attempt was made.
    ConfigurationMissing,
    /// Transport errors or non-2xx statuses persisted through every retry.
    ExternalServiceUnavailable,
    /// The provider answered but carried no usable content.
    EmptyResponse,
    /// Content was present but did not parse into the expected shape.
    MalformedModelOutput,
    /// The caller abandoned the call before it finished.
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "configuration_missing",
            Self::ExternalServiceUnavailable => "external_service_unavailable",
            Self::EmptyResponse => "empty_response",
            Self::MalformedModelOutput => "malformed_model_output",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of one inference call.
///
/// Carries the kind, a human-readable message, and for
/// [`FailureKind::MalformedModelOutput`] the verbatim model text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw_output: None,
        }
    }

    pub fn configuration_missing(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ConfigurationMissing, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ExternalServiceUnavailable, message)
    }

    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::new(FailureKind::EmptyResponse, message)
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "call abandoned by caller")
    }

    /// A decoding failure that keeps the original model text for diagnostics.
    pub fn malformed(message: impl Into<String>, raw_output: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::MalformedModelOutput,
            message: message.into(),
            raw_output: Some(raw_output.into()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WeatherError {
    #[error("Weather request failed: {0}")]
    Network(String),

    #[error("Weather service returned status {status_code}")]
    Status { status_code: u16 },

    #[error("Unexpected weather payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid coordinates: lat {latitude}, lon {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Unsupported image type: {0}")]
    UnsupportedMimeType(String),

    #[error("Image payload is not valid base64: {0}")]
    Decode(String),

    #[error("Failed to read image {path}: {reason}")]
    Read { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
