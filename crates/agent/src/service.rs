//! Wardrobe service — the assistant wired to its collaborators.
//!
//! Loads the read-only snapshots (wardrobe, feedback, weather) that
//! context assembly needs, invokes the assistant, and persists scan
//! results. Both the HTTP API and the CLI drive the app through this type.

use crate::assistant::WardrobeAssistant;
use crate::context::{ChatContext, OutfitContext};
use std::sync::Arc;
use tracing::{info, warn};
use wardrobe_core::cancel::CancellationToken;
use wardrobe_core::error::{Result, StoreError};
use wardrobe_core::inference::{ChatTurn, ImagePayload};
use wardrobe_core::store::WardrobeStore;
use wardrobe_core::wardrobe::{FeedbackRecord, OutfitPlan, WardrobeItem};
use wardrobe_core::weather::{Location, WeatherSnapshot, WeatherSource};

/// An outfit plan together with the weather it was planned for.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub plan: OutfitPlan,
    pub weather: Option<WeatherSnapshot>,
}

pub struct WardrobeService {
    assistant: WardrobeAssistant,
    store: Arc<dyn WardrobeStore>,
    weather: Arc<dyn WeatherSource>,
    user_id: String,
    home: Location,
}

impl WardrobeService {
    pub fn new(
        assistant: WardrobeAssistant,
        store: Arc<dyn WardrobeStore>,
        weather: Arc<dyn WeatherSource>,
        user_id: impl Into<String>,
        home: Location,
    ) -> Self {
        Self {
            assistant,
            store,
            weather,
            user_id: user_id.into(),
            home,
        }
    }

    pub fn home(&self) -> &Location {
        &self.home
    }

    /// Current conditions at `location` (or home). Errors propagate.
    pub async fn weather_at(&self, location: Option<&Location>) -> Result<WeatherSnapshot> {
        let location = location.unwrap_or(&self.home);
        Ok(self.weather.current(location).await?)
    }

    /// Current conditions at `location` (or home), or `None` when the
    /// fetch fails.
    pub async fn weather_or_none(&self, location: Option<&Location>) -> Option<WeatherSnapshot> {
        let location = location.unwrap_or(&self.home);
        match self.weather.current(location).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(source = self.weather.name(), error = %e, "Weather unavailable, continuing without it");
                None
            }
        }
    }

    pub async fn items(&self) -> Result<Vec<WardrobeItem>> {
        Ok(self.store.list_items(&self.user_id).await?)
    }

    pub async fn remove_item(&self, item_id: &str) -> Result<bool> {
        Ok(self.store.remove_item(&self.user_id, item_id).await?)
    }

    pub async fn feedback(&self) -> Result<Vec<FeedbackRecord>> {
        Ok(self.store.list_feedback(&self.user_id).await?)
    }

    /// Validate and append one feedback record dated today.
    pub async fn add_feedback(&self, score: u8, comment: &str) -> Result<FeedbackRecord> {
        let record = FeedbackRecord::new(score, comment)?;
        self.store
            .add_feedback(&self.user_id, record.clone())
            .await?;
        Ok(record)
    }

    /// Classify photos and persist one item per photo, in input order.
    ///
    /// `image_refs[i]` is stored as the item's image reference; when absent
    /// the photo's data URI is used. The batch is stored all or nothing,
    /// and only once every photo has classified.
    pub async fn scan(
        &self,
        images: Vec<ImagePayload>,
        image_refs: Option<Vec<String>>,
        cancel: &CancellationToken,
    ) -> Result<Vec<WardrobeItem>> {
        if let Some(refs) = &image_refs {
            if refs.len() != images.len() {
                return Err(StoreError::InvalidRecord(format!(
                    "{} image reference(s) for {} image(s)",
                    refs.len(),
                    images.len()
                ))
                .into());
            }
        }

        let classified = self
            .assistant
            .classify_images_with_cancel(images, cancel)
            .await?;

        let mut refs = image_refs.map(Vec::into_iter);
        let stored: Vec<WardrobeItem> = classified
            .into_iter()
            .map(|entry| {
                let image_ref = refs
                    .as_mut()
                    .and_then(|it| it.next())
                    .unwrap_or_else(|| entry.image.to_data_uri());
                WardrobeItem::from_classification(entry.classification, image_ref)
            })
            .collect();
        self.store.add_items(&self.user_id, stored.clone()).await?;

        info!(user = %self.user_id, added = stored.len(), "Scan stored new wardrobe items");
        Ok(stored)
    }

    /// Recommend an outfit from the stored wardrobe and the current
    /// weather at `location` (or home).
    pub async fn recommend(
        &self,
        destination: &str,
        activity: &str,
        location: Option<&Location>,
        cancel: &CancellationToken,
    ) -> Result<Recommendation> {
        let wardrobe = self.items().await?;
        let feedback = self.feedback().await?;
        let weather = self.weather_or_none(location).await;

        let ctx = OutfitContext {
            weather: weather.as_ref(),
            wardrobe: &wardrobe,
            destination,
            activity,
            feedback: &feedback,
        };
        let plan = self
            .assistant
            .recommend_outfit_with_cancel(&ctx, cancel)
            .await?;
        Ok(Recommendation { plan, weather })
    }

    /// Answer one chat message, grounded in the weather at `location`
    /// (or home).
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatTurn],
        location: Option<&Location>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let wardrobe = self.items().await?;
        let weather = self.weather_or_none(location).await;

        let ctx = ChatContext {
            weather: weather.as_ref(),
            wardrobe: &wardrobe,
            history,
            message,
        };
        Ok(self.assistant.chat_with_cancel(&ctx, cancel).await?)
    }
}
