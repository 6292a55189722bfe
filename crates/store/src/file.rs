//! File-based store — persistent JSON-lines storage.
//!
//! One JSONL file per (user, collection), each line one JSON record:
//!
//! ```text
//! <root>/<user_id>/items.jsonl
//! <root>/<user_id>/feedback.jsonl
//! ```
//!
//! A user's files are loaded on first access and cached; every mutation
//! rewrites the affected collection. Corrupted lines are skipped with a
//! warning rather than failing the whole load.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use wardrobe_core::error::StoreError;
use wardrobe_core::store::{FEEDBACK_COLLECTION, ITEMS_COLLECTION, WardrobeStore};
use wardrobe_core::wardrobe::{FeedbackRecord, WardrobeItem};

#[derive(Debug, Default)]
struct Shelf {
    items: Vec<WardrobeItem>,
    feedback: Vec<FeedbackRecord>,
}

/// A JSONL-file-backed [`WardrobeStore`].
pub struct FileStore {
    root: PathBuf,
    shelves: Arc<RwLock<HashMap<String, Shelf>>>,
}

impl FileStore {
    /// Create a store rooted at `root`. Nothing is read until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            shelves: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Path of one collection file.
    pub fn collection_path(&self, user_id: &str, collection: &str) -> PathBuf {
        self.root.join(user_id).join(format!("{collection}.jsonl"))
    }

    /// Load the user's shelf into the cache if it is not there yet.
    async fn ensure_loaded(&self, user_id: &str) -> Result<(), StoreError> {
        validate_user_id(user_id)?;
        if self.shelves.read().await.contains_key(user_id) {
            return Ok(());
        }

        let mut shelves = self.shelves.write().await;
        if !shelves.contains_key(user_id) {
            let shelf = Shelf {
                items: load_collection(&self.collection_path(user_id, ITEMS_COLLECTION))?,
                feedback: load_collection(&self.collection_path(user_id, FEEDBACK_COLLECTION))?,
            };
            debug!(
                user = user_id,
                items = shelf.items.len(),
                feedback = shelf.feedback.len(),
                "File store loaded user shelf"
            );
            shelves.insert(user_id.to_string(), shelf);
        }
        Ok(())
    }
}

#[async_trait]
impl WardrobeStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn list_items(&self, user_id: &str) -> Result<Vec<WardrobeItem>, StoreError> {
        self.ensure_loaded(user_id).await?;
        let shelves = self.shelves.read().await;
        Ok(shelves
            .get(user_id)
            .map(|s| s.items.clone())
            .unwrap_or_default())
    }

    async fn add_item(&self, user_id: &str, item: WardrobeItem) -> Result<String, StoreError> {
        self.ensure_loaded(user_id).await?;
        let id = item.id.clone();
        let mut shelves = self.shelves.write().await;
        let shelf = shelves.entry(user_id.to_string()).or_default();
        shelf.items.push(item);
        if let Err(e) = flush_collection(&self.collection_path(user_id, ITEMS_COLLECTION), &shelf.items) {
            shelf.items.pop();
            return Err(e);
        }
        Ok(id)
    }

    async fn add_items(
        &self,
        user_id: &str,
        items: Vec<WardrobeItem>,
    ) -> Result<Vec<String>, StoreError> {
        self.ensure_loaded(user_id).await?;
        let ids = items.iter().map(|i| i.id.clone()).collect();
        let mut shelves = self.shelves.write().await;
        let shelf = shelves.entry(user_id.to_string()).or_default();
        let before = shelf.items.len();
        shelf.items.extend(items);
        if let Err(e) = flush_collection(&self.collection_path(user_id, ITEMS_COLLECTION), &shelf.items) {
            shelf.items.truncate(before);
            return Err(e);
        }
        Ok(ids)
    }

    async fn remove_item(&self, user_id: &str, item_id: &str) -> Result<bool, StoreError> {
        self.ensure_loaded(user_id).await?;
        let mut shelves = self.shelves.write().await;
        let shelf = shelves.entry(user_id.to_string()).or_default();
        let Some(position) = shelf.items.iter().position(|i| i.id == item_id) else {
            return Ok(false);
        };
        let removed = shelf.items.remove(position);
        if let Err(e) = flush_collection(&self.collection_path(user_id, ITEMS_COLLECTION), &shelf.items) {
            shelf.items.insert(position, removed);
            return Err(e);
        }
        Ok(true)
    }

    async fn list_feedback(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.ensure_loaded(user_id).await?;
        let shelves = self.shelves.read().await;
        Ok(shelves
            .get(user_id)
            .map(|s| s.feedback.clone())
            .unwrap_or_default())
    }

    async fn add_feedback(&self, user_id: &str, record: FeedbackRecord) -> Result<(), StoreError> {
        self.ensure_loaded(user_id).await?;
        let mut shelves = self.shelves.write().await;
        let shelf = shelves.entry(user_id.to_string()).or_default();
        shelf.feedback.push(record);
        if let Err(e) = flush_collection(
            &self.collection_path(user_id, FEEDBACK_COLLECTION),
            &shelf.feedback,
        ) {
            shelf.feedback.pop();
            return Err(e);
        }
        Ok(())
    }
}

/// User ids become directory names; keep them to one safe path segment.
fn validate_user_id(user_id: &str) -> Result<(), StoreError> {
    let valid = !user_id.is_empty()
        && user_id != "."
        && user_id != ".."
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidRecord(format!(
            "user id {user_id:?} is not a valid storage key"
        )))
    }
}

fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StoreError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            )));
        }
    };

    Ok(content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(number, line)| match serde_json::from_str::<T>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = number + 1,
                    error = %e,
                    "Skipping corrupted record"
                );
                None
            }
        })
        .collect())
}

fn flush_collection<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::Storage(format!("Failed to create store directory: {e}")))?;
    }

    let mut content = String::new();
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| StoreError::Storage(format!("Failed to serialize record: {e}")))?;
        content.push_str(&line);
        content.push('\n');
    }

    std::fs::write(path, &content)
        .map_err(|e| StoreError::Storage(format!("Failed to write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wardrobe_core::wardrobe::{Category, Classification};

    fn item(category: Category, color: &str) -> WardrobeItem {
        WardrobeItem::from_classification(
            Classification {
                category,
                color: color.into(),
                style: "casual".into(),
                material: Some("cotton".into()),
                reason: None,
            },
            "data:image/png;base64,AA==",
        )
    }

    #[tokio::test]
    async fn items_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let first = item(Category::Top, "white");
        let second = item(Category::Shoes, "black");

        {
            let store = FileStore::new(dir.path());
            store.add_item("alice", first.clone()).await.unwrap();
            store.add_item("alice", second.clone()).await.unwrap();
        }

        let reopened = FileStore::new(dir.path());
        let items = reopened.list_items("alice").await.unwrap();
        assert_eq!(items, vec![first, second]);
        assert!(dir.path().join("alice").join("items.jsonl").exists());
    }

    #[tokio::test]
    async fn batch_is_written_in_one_flush() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let batch = vec![item(Category::Top, "white"), item(Category::Bottom, "blue")];
        let ids = store.add_items("alice", batch.clone()).await.unwrap();
        assert_eq!(ids, vec![batch[0].id.clone(), batch[1].id.clone()]);

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.list_items("alice").await.unwrap(), batch);
    }

    #[tokio::test]
    async fn failed_batch_flush_leaves_cache_untouched() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let kept = item(Category::Shoes, "black");
        store.add_item("alice", kept.clone()).await.unwrap();

        // A directory where the collection file should be makes the write fail.
        let items_path = store.collection_path("alice", ITEMS_COLLECTION);
        std::fs::remove_file(&items_path).unwrap();
        std::fs::create_dir(&items_path).unwrap();

        let err = store
            .add_items("alice", vec![item(Category::Top, "red"), item(Category::Top, "blue")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert_eq!(store.list_items("alice").await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn remove_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let keep = item(Category::Bottom, "grey");
        let id = store.add_item("u", item(Category::Top, "red")).await.unwrap();
        store.add_item("u", keep.clone()).await.unwrap();

        assert!(store.remove_item("u", &id).await.unwrap());
        assert!(!store.remove_item("u", "missing").await.unwrap());

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.list_items("u").await.unwrap(), vec![keep]);
    }

    #[tokio::test]
    async fn feedback_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let record = FeedbackRecord {
            score: 4,
            comment: "nice colors".into(),
            date: "2026-03-01".into(),
        };
        store.add_feedback("u", record.clone()).await.unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.list_feedback("u").await.unwrap(), vec![record]);
        assert!(reopened.list_items("u").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupted_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let good = item(Category::Outerwear, "navy");
        let user_dir = dir.path().join("u");
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::write(
            user_dir.join("items.jsonl"),
            format!(
                "{}\nnot json at all\n\n{{\"id\": \"half\"}}\n",
                serde_json::to_string(&good).unwrap()
            ),
        )
        .unwrap();

        let store = FileStore::new(dir.path());
        assert_eq!(store.list_items("u").await.unwrap(), vec![good]);
    }

    #[tokio::test]
    async fn missing_user_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.list_items("nobody").await.unwrap().is_empty());
        assert!(store.list_feedback("nobody").await.unwrap().is_empty());
        assert!(!dir.path().join("nobody").exists());
    }

    #[tokio::test]
    async fn unsafe_user_ids_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        for bad in ["", "..", "../etc", "a/b", "a\\b"] {
            let err = store.list_items(bad).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidRecord(_)), "{bad}");
        }
    }

    #[test]
    fn collection_path_layout() {
        let store = FileStore::new("/data");
        assert_eq!(
            store.collection_path("local", "feedback"),
            PathBuf::from("/data/local/feedback.jsonl")
        );
    }
}
