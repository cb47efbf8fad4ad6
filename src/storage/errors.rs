//! Storage-specific error types for pure data operations.
//!
//! These errors describe persistence failures only. They know nothing about
//! mapping rules or realm semantics.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entry was not found.
    #[error("Entry not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Data could not be converted to or from its stored form.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Storage backend is temporarily unavailable.
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    /// Generic internal storage error.
    #[error("Internal storage error: {message}")]
    Internal { message: String },
}

impl StorageError {
    /// Create a not found error.
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error indicates a missing entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Check if retrying the operation may succeed.
    pub fn is_temporary(&self) -> bool {
        matches!(self, StorageError::Unavailable { .. })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}
