//! Gemini `generateContent` wire format.
//!
//! Request body:
//! `{contents: [{role?, parts: [...]}], systemInstruction?: {parts: [{text}]}}`
//! where each part is `{text}` or `{inlineData: {mimeType, data}}`.
//!
//! Response body: `{candidates: [{content: {parts: [{text}]}}]}`. Only the
//! first candidate's first part is ever consumed.

use serde::{Deserialize, Serialize};
use wardrobe_core::error::Failure;
use wardrobe_core::inference::{ChatRole, InferenceRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// Base64, standard alphabet, padded.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

/// Build the request body for one call.
///
/// Single-turn requests carry one unroled content entry: the instruction
/// text followed by every image in input order. When chat history is
/// present, each prior turn becomes its own roled entry and the current
/// instruction is appended as the final `user` entry.
pub fn encode(request: &InferenceRequest) -> GenerateContentRequest {
    let mut current_parts = Vec::with_capacity(1 + request.images().len());
    current_parts.push(Part::Text {
        text: request.instruction().to_string(),
    });
    current_parts.extend(request.images().iter().map(|image| Part::InlineData {
        inline_data: InlineData {
            mime_type: image.mime_type().to_string(),
            data: image.to_base64(),
        },
    }));

    let contents = if request.history().is_empty() {
        vec![Content {
            role: None,
            parts: current_parts,
        }]
    } else {
        let mut contents: Vec<Content> = request
            .history()
            .iter()
            .map(|turn| Content {
                role: Some(turn.role.as_str().to_string()),
                parts: vec![Part::Text {
                    text: turn.text.clone(),
                }],
            })
            .collect();
        contents.push(Content {
            role: Some(ChatRole::User.as_str().to_string()),
            parts: current_parts,
        });
        contents
    };

    GenerateContentRequest {
        contents,
        system_instruction: request.system_preamble().map(|text| SystemInstruction {
            parts: vec![Part::Text {
                text: text.to_string(),
            }],
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// The first candidate's first text part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Pull the generated text out of a 2xx response body.
pub fn extract_text(body: &str) -> Result<String, Failure> {
    let envelope: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        Failure::empty_response(format!("provider response is not a readable envelope: {e}"))
    })?;

    match envelope.first_text() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        Some(_) => Err(Failure::empty_response("provider returned an empty text part")),
        None => {
            let reason = envelope
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("no candidates");
            Err(Failure::empty_response(format!(
                "provider returned no usable content ({reason})"
            )))
        }
    }
}
