//! In-memory storage implementation.
//!
//! Thread-safe `StorageProvider` backed by nested maps behind a tokio `RwLock`.
//! Intended for tests, development and embedded use where durability is not
//! required.

use crate::storage::{StorageError, StorageKey, StorageProvider};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory storage.
///
/// Layout: `collection` → `id` → `data`. Ids are kept ordered so that `list`
/// returns a stable sequence.
#[derive(Clone)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, BTreeMap<String, Value>>>>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage instance.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of documents stored in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        let data_guard = self.data.read().await;
        data_guard.get(collection).map(BTreeMap::len).unwrap_or(0)
    }

    /// Clear all data (useful for testing).
    pub async fn clear(&self) {
        let mut data_guard = self.data.write().await;
        data_guard.clear();
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageProvider for InMemoryStorage {
    type Error = StorageError;

    async fn put(&self, key: StorageKey, data: Value) -> Result<Value, Self::Error> {
        let mut data_guard = self.data.write().await;
        data_guard
            .entry(key.collection().to_string())
            .or_default()
            .insert(key.id().to_string(), data.clone());
        Ok(data)
    }

    async fn get(&self, key: StorageKey) -> Result<Option<Value>, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard
            .get(key.collection())
            .and_then(|documents| documents.get(key.id()))
            .cloned())
    }

    async fn delete(&self, key: StorageKey) -> Result<bool, Self::Error> {
        let mut data_guard = self.data.write().await;
        Ok(data_guard
            .get_mut(key.collection())
            .map(|documents| documents.remove(key.id()).is_some())
            .unwrap_or(false))
    }

    async fn list(&self, collection: &str) -> Result<Vec<(StorageKey, Value)>, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, data)| (StorageKey::new(collection, id.clone()), data.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn exists(&self, key: StorageKey) -> Result<bool, Self::Error> {
        let data_guard = self.data.read().await;
        Ok(data_guard
            .get(key.collection())
            .is_some_and(|documents| documents.contains_key(key.id())))
    }
}
