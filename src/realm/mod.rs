//! Realms: the organizational-unit tree.
//!
//! Every realm is addressed by its [`RealmPath`]. A realm's path is always its
//! parent's path plus its own name, so the tree cannot contain cycles and no two
//! realms share a path. Names are fixed once a realm exists; only the payload can
//! change.
//!
//! # Example
//!
//! ```rust
//! use idm_core::realm::{NewRealm, RealmTree};
//! use idm_core::storage::InMemoryStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = RealmTree::new(InMemoryStorage::new()).await?;
//! let even = tree.create("/", NewRealm::new("even")).await?;
//! tree.create("even", NewRealm::new("two")).await?;
//!
//! assert_eq!(even.full_path.as_str(), "/even");
//! assert_eq!(tree.list_at("/even").await?.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod path;
pub mod tree;

pub use path::{InvalidPath, RealmPath, SEPARATOR};
pub use tree::{REALM_COLLECTION, RealmTree};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One organizational unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmNode {
    /// Generated identifier
    pub key: String,
    /// Last path segment, `/` for the root
    pub name: String,
    /// Unique hierarchical address
    pub full_path: RealmPath,
    /// Key of the parent realm; `None` only for the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    /// Arbitrary realm configuration
    #[serde(default)]
    pub payload: Value,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl RealmNode {
    pub(crate) fn root(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            full_path: RealmPath::root(),
            parent_key: None,
            payload: Value::Null,
            created: now,
            last_modified: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.full_path.is_root()
    }

    /// Replace the payload, keeping identity and path.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Realm to be created below an existing parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRealm {
    /// Path segment of the new realm
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

impl NewRealm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}
