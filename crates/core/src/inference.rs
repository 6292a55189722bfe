//! Inference request and result types.
//!
//! An [`InferenceRequest`] is assembled once per call and never mutated
//! afterwards: the gateway resends the same value on every retry.
//! Results are plain `Result`s whose error side is a typed [`Failure`].

use crate::error::{Failure, ImageError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Outcome of one public inference operation.
pub type InferenceResult<T> = std::result::Result<T, Failure>;

/// Binary image content plus its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    mime_type: String,
    data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ImageError::InvalidDataUri("missing 'data:' prefix".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ImageError::InvalidDataUri("missing ',' separator".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| ImageError::InvalidDataUri("only base64 data URIs are supported".into()))?;
        if !mime_type.starts_with("image/") {
            return Err(ImageError::UnsupportedMimeType(mime_type.to_string()));
        }
        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        Ok(Self::new(mime_type, data))
    }

    /// Guess the MIME type from a file extension.
    pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "webp" => Some("image/webp"),
            "gif" => Some("image/gif"),
            "heic" => Some("image/heic"),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

// Image bytes are large and opaque; keep Debug output readable.
impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Who spoke a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One prior turn of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Everything the gateway sends for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    instruction: String,
    images: Vec<ImagePayload>,
    system_preamble: Option<String>,
    history: Vec<ChatTurn>,
}

impl InferenceRequest {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            images: Vec::new(),
            system_preamble: None,
            history: Vec::new(),
        }
    }

    /// Attach images in order. The order is preserved on the wire.
    pub fn with_images(mut self, images: Vec<ImagePayload>) -> Self {
        self.images = images;
        self
    }

    pub fn with_system_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.system_preamble = Some(preamble.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn images(&self) -> &[ImagePayload] {
        &self.images
    }

    pub fn system_preamble(&self) -> Option<&str> {
        self.system_preamble.as_deref()
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }
}

/// Phases of a single inference call.
///
/// `Idle → Assembling → Sending → (Retrying ⇄ Sending)* → Decoding → {Succeeded | Failed}`.
/// Each call owns its own progression; nothing is shared between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    Idle,
    Assembling,
    Sending,
    Retrying,
    Decoding,
    Succeeded,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_roundtrip() {
        let image = ImagePayload::new("image/png", vec![1, 2, 3, 4]);
        let uri = image.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));
        let parsed = ImagePayload::from_data_uri(&uri).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn data_uri_rejects_garbage() {
        assert!(matches!(
            ImagePayload::from_data_uri("https://example.com/a.png"),
            Err(ImageError::InvalidDataUri(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:text/plain;base64,aGk="),
            Err(ImageError::UnsupportedMimeType(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:image/png;base64,%%%"),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn debug_hides_bytes() {
        let image = ImagePayload::new("image/jpeg", vec![0; 2048]);
        let debug = format!("{image:?}");
        assert!(debug.contains("2048"));
        assert!(!debug.contains("0, 0"));
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(ImagePayload::mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(ImagePayload::mime_for_extension("txt"), None);
    }

    #[test]
    fn request_builder_keeps_order() {
        let a = ImagePayload::new("image/png", vec![1]);
        let b = ImagePayload::new("image/png", vec![2]);
        let request = InferenceRequest::new("classify")
            .with_images(vec![a.clone(), b.clone()])
            .with_system_preamble("you are a stylist");
        assert_eq!(request.images(), &[a, b]);
        assert_eq!(request.system_preamble(), Some("you are a stylist"));
        assert!(request.history().is_empty());
    }
}
