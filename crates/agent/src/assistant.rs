//! The wardrobe assistant — the three public inference operations.
//!
//! Each operation runs one call through the same state machine:
//!
//! ```text
//! Idle → Assembling → Sending → (Retrying ⇄ Sending)* → Decoding → Succeeded | Failed
//! ```
//!
//! The `Sending`/`Retrying` loop lives in [`InferenceGateway`]; this module
//! owns assembly, decoding, and the image/result alignment check. Nothing
//! is shared between calls, so concurrent operations race freely.

use crate::context::{ChatContext, ContextAssembler, Intent, OutfitContext};
use crate::decoder;
use tracing::{debug, info, warn};
use wardrobe_config::AppConfig;
use wardrobe_core::cancel::CancellationToken;
use wardrobe_core::error::Failure;
use wardrobe_core::inference::{CallPhase, ImagePayload, InferenceRequest, InferenceResult};
use wardrobe_core::wardrobe::{Classification, OutfitPlan};
use wardrobe_providers::gateway::InferenceGateway;
use wardrobe_providers::transport::TransportError;

/// An input image paired with the classification decoded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedImage {
    pub image: ImagePayload,
    pub classification: Classification,
}

pub struct WardrobeAssistant {
    gateway: InferenceGateway,
    assembler: ContextAssembler,
}

impl WardrobeAssistant {
    pub fn new(gateway: InferenceGateway, assembler: ContextAssembler) -> Self {
        Self { gateway, assembler }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        Ok(Self::new(
            InferenceGateway::from_config(config)?,
            ContextAssembler::from_config(&config.assistant),
        ))
    }

    /// Classify photos; `result[i]` belongs to `images[i]`.
    pub async fn classify_images(
        &self,
        images: Vec<ImagePayload>,
    ) -> InferenceResult<Vec<ClassifiedImage>> {
        self.classify_images_with_cancel(images, &CancellationToken::new())
            .await
    }

    pub async fn classify_images_with_cancel(
        &self,
        images: Vec<ImagePayload>,
        cancel: &CancellationToken,
    ) -> InferenceResult<Vec<ClassifiedImage>> {
        if images.is_empty() {
            debug!("No images to classify");
            return Ok(Vec::new());
        }

        let expected = images.len();
        debug!(phase = ?CallPhase::Assembling, images = expected, "Assembling classification request");
        let request = self.assembler.classification(images);

        let classifications = self
            .run(Intent::ImageClassification, &request, cancel, |raw| {
                let decoded = decoder::decode_classifications(raw)?;
                if decoded.len() != expected {
                    return Err(Failure::malformed(
                        format!(
                            "expected {expected} classification(s), model returned {}",
                            decoded.len()
                        ),
                        raw,
                    ));
                }
                Ok(decoded)
            })
            .await?;

        Ok(request
            .images()
            .iter()
            .cloned()
            .zip(classifications)
            .map(|(image, classification)| ClassifiedImage {
                image,
                classification,
            })
            .collect())
    }

    /// Recommend one outfit from the wardrobe for the given context.
    pub async fn recommend_outfit(&self, ctx: &OutfitContext<'_>) -> InferenceResult<OutfitPlan> {
        self.recommend_outfit_with_cancel(ctx, &CancellationToken::new())
            .await
    }

    pub async fn recommend_outfit_with_cancel(
        &self,
        ctx: &OutfitContext<'_>,
        cancel: &CancellationToken,
    ) -> InferenceResult<OutfitPlan> {
        debug!(
            phase = ?CallPhase::Assembling,
            wardrobe = ctx.wardrobe.len(),
            feedback = ctx.feedback.len(),
            "Assembling outfit request"
        );
        let request = self.assembler.outfit(ctx);
        self.run(Intent::OutfitRecommendation, &request, cancel, decoder::decode_outfit_plan)
            .await
    }

    /// Answer a chat message in the context of weather and wardrobe.
    pub async fn chat(&self, ctx: &ChatContext<'_>) -> InferenceResult<String> {
        self.chat_with_cancel(ctx, &CancellationToken::new()).await
    }

    pub async fn chat_with_cancel(
        &self,
        ctx: &ChatContext<'_>,
        cancel: &CancellationToken,
    ) -> InferenceResult<String> {
        debug!(
            phase = ?CallPhase::Assembling,
            history = ctx.history.len(),
            "Assembling chat request"
        );
        let request = self.assembler.chat(ctx);
        self.run(Intent::FreeformChat, &request, cancel, |raw| {
            Ok(decoder::decode_plain_text(raw))
        })
        .await
    }

    /// Send, decode, and log the terminal phase.
    async fn run<T>(
        &self,
        intent: Intent,
        request: &InferenceRequest,
        cancel: &CancellationToken,
        decode: impl FnOnce(&str) -> Result<T, Failure>,
    ) -> InferenceResult<T> {
        let outcome = match self.gateway.send_with_cancel(request, cancel).await {
            Ok(raw) => {
                debug!(phase = ?CallPhase::Decoding, ?intent, bytes = raw.len(), "Decoding model output");
                decode(&raw)
            }
            Err(failure) => Err(failure),
        };

        match &outcome {
            Ok(_) => info!(phase = ?CallPhase::Succeeded, ?intent, "Inference call succeeded"),
            Err(failure) => warn!(
                phase = ?CallPhase::Failed,
                ?intent,
                kind = %failure.kind,
                message = %failure.message,
                "Inference call failed"
            ),
        }
        outcome
    }
}
