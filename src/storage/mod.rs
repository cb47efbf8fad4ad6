//! Storage abstraction for validated configuration and realm data.
//!
//! The `StorageProvider` trait is the persistence collaborator of this crate. It
//! stores JSON documents grouped in collections and has no knowledge of mapping
//! rules or realm hierarchy. Callers are responsible for only handing it data that
//! already passed validation.
//!
//! # Example Usage
//!
//! ```rust
//! use idm_core::storage::{InMemoryStorage, StorageKey, StorageProvider};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryStorage::new();
//!
//! let key = StorageKey::new("mapping", "google");
//! storage.put(key.clone(), json!({"key": "google"})).await?;
//!
//! assert!(storage.exists(key.clone()).await?);
//! assert!(storage.delete(key).await?);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::StorageError;
pub use in_memory::InMemoryStorage;

use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Identifies a stored document: `collection` → `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    collection: String,
    id: String,
}

impl StorageKey {
    /// Create a new storage key.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Get the collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Get the document id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Core trait for storage providers that handle pure data persistence.
///
/// - **PUT/GET/DELETE model**: create and update are both a `put`.
/// - **PUT returns data**: the stored document is returned to the caller.
/// - **DELETE returns bool**: whether the document existed.
pub trait StorageProvider: Send + Sync {
    /// The error type returned by storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store data at the specified key, replacing any previous document.
    fn put(
        &self,
        key: StorageKey,
        data: Value,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send;

    /// Retrieve data by key.
    fn get(
        &self,
        key: StorageKey,
    ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// Delete data by key. Returns `true` if the document existed.
    fn delete(&self, key: StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// List every document of a collection, ordered by id.
    fn list(
        &self,
        collection: &str,
    ) -> impl Future<Output = Result<Vec<(StorageKey, Value)>, Self::Error>> + Send;

    /// Check if a document exists.
    fn exists(&self, key: StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}
