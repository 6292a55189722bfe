//! Store trait — the wardrobe persistence collaborator.
//!
//! A schema-less document store keyed by (user id, collection). The
//! inference path only ever reads snapshots from it; scans append items
//! and the feedback form appends feedback records.

use crate::error::StoreError;
use crate::wardrobe::{FeedbackRecord, WardrobeItem};
use async_trait::async_trait;
use tracing::warn;

/// Collection holding [`WardrobeItem`]s.
pub const ITEMS_COLLECTION: &str = "items";

/// Collection holding [`FeedbackRecord`]s.
pub const FEEDBACK_COLLECTION: &str = "feedback";

#[async_trait]
pub trait WardrobeStore: Send + Sync {
    /// A human-readable backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// All items for a user, oldest first.
    async fn list_items(&self, user_id: &str) -> Result<Vec<WardrobeItem>, StoreError>;

    /// Append an item and return its id.
    async fn add_item(&self, user_id: &str, item: WardrobeItem) -> Result<String, StoreError>;

    /// Remove an item by id. Returns `false` when nothing matched.
    async fn remove_item(&self, user_id: &str, item_id: &str) -> Result<bool, StoreError>;

    /// All feedback for a user, oldest first.
    async fn list_feedback(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// Append a feedback record.
    async fn add_feedback(&self, user_id: &str, record: FeedbackRecord) -> Result<(), StoreError>;

    /// Append a batch of items, all or nothing. Returns their ids in order.
    ///
    /// The default adds items one at a time and removes the ones already
    /// added when a later one fails.
    async fn add_items(
        &self,
        user_id: &str,
        items: Vec<WardrobeItem>,
    ) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            match self.add_item(user_id, item).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    for id in &ids {
                        if let Err(undo) = self.remove_item(user_id, id).await {
                            warn!(
                                store = self.name(),
                                item = %id,
                                error = %undo,
                                "Failed to roll back partially added batch"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(ids)
    }
}
