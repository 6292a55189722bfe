//! Persistence backends for the wardrobe assistant.
//!
//! Both backends implement `wardrobe_core::WardrobeStore`, a schema-less
//! document store keyed by (user id, collection).

pub mod file;
pub mod in_memory;

pub use file::FileStore;
pub use in_memory::InMemoryStore;

use std::sync::Arc;
use wardrobe_config::StoreConfig;
use wardrobe_core::store::WardrobeStore;

/// Build the backend named in configuration.
pub fn from_config(config: &StoreConfig) -> Arc<dyn WardrobeStore> {
    match config.backend.as_str() {
        "memory" => Arc::new(InMemoryStore::new()),
        _ => Arc::new(FileStore::new(config.root_dir())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_selection() {
        let mut config = StoreConfig::default();
        config.backend = "memory".into();
        assert_eq!(from_config(&config).name(), "in_memory");

        config.backend = "file".into();
        config.path = Some("/tmp/wardrobe-test-data".into());
        assert_eq!(from_config(&config).name(), "file");
    }
}
