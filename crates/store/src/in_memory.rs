//! In-memory store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use wardrobe_core::error::StoreError;
use wardrobe_core::store::WardrobeStore;
use wardrobe_core::wardrobe::{FeedbackRecord, WardrobeItem};

#[derive(Debug, Default, Clone)]
struct Shelf {
    items: Vec<WardrobeItem>,
    feedback: Vec<FeedbackRecord>,
}

/// A store that keeps every user's collections in process memory.
/// Contents vanish when the process exits.
pub struct InMemoryStore {
    shelves: Arc<RwLock<HashMap<String, Shelf>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            shelves: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WardrobeStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list_items(&self, user_id: &str) -> Result<Vec<WardrobeItem>, StoreError> {
        let shelves = self.shelves.read().await;
        Ok(shelves
            .get(user_id)
            .map(|s| s.items.clone())
            .unwrap_or_default())
    }

    async fn add_item(&self, user_id: &str, item: WardrobeItem) -> Result<String, StoreError> {
        let id = item.id.clone();
        self.shelves
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .items
            .push(item);
        Ok(id)
    }

    async fn add_items(
        &self,
        user_id: &str,
        items: Vec<WardrobeItem>,
    ) -> Result<Vec<String>, StoreError> {
        let ids = items.iter().map(|i| i.id.clone()).collect();
        self.shelves
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .items
            .extend(items);
        Ok(ids)
    }

    async fn remove_item(&self, user_id: &str, item_id: &str) -> Result<bool, StoreError> {
        let mut shelves = self.shelves.write().await;
        let Some(shelf) = shelves.get_mut(user_id) else {
            return Ok(false);
        };
        let len_before = shelf.items.len();
        shelf.items.retain(|i| i.id != item_id);
        Ok(shelf.items.len() < len_before)
    }

    async fn list_feedback(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        let shelves = self.shelves.read().await;
        Ok(shelves
            .get(user_id)
            .map(|s| s.feedback.clone())
            .unwrap_or_default())
    }

    async fn add_feedback(&self, user_id: &str, record: FeedbackRecord) -> Result<(), StoreError> {
        self.shelves
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .feedback
            .push(record);
        Ok(())
    }
}
