//! Shared, lock-protected realm tree with write-through persistence.
//!
//! All nodes live in one ordered map behind a tokio `RwLock`. Mutations take the
//! write lock for their whole duration, including the storage round trip, so they
//! are serialized against each other and readers never see a half-applied change.
//! Storage is written before the in-memory map: if storage fails, the tree is left
//! exactly as it was.

use super::path::RealmPath;
use super::{NewRealm, RealmNode};
use crate::error::{IdmError, IdmResult, ViolationKind};
use crate::mapping::contains_markup;
use crate::storage::{StorageError, StorageKey, StorageProvider};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

/// Storage collection holding realm nodes, keyed by realm key.
pub const REALM_COLLECTION: &str = "realm";

/// Organizational-unit tree keyed by full path.
///
/// Path parameters are matched greedily: `list_at("even/two")` addresses the realm
/// whose full path is `/even/two`.
pub struct RealmTree<S> {
    nodes: RwLock<BTreeMap<RealmPath, RealmNode>>,
    storage: S,
}

impl<S> RealmTree<S>
where
    S: StorageProvider,
    S::Error: Into<StorageError>,
{
    /// Load the tree from storage, creating and storing a root named `/` if
    /// there is none yet.
    pub async fn new(storage: S) -> IdmResult<Self> {
        Self::load(storage, "/").await
    }

    /// Rebuild a tree from the realms previously written to storage.
    ///
    /// Nodes whose parent is missing, or whose `parent_key` does not match the
    /// stored parent, are skipped. A root is created and stored when none exists.
    pub async fn load(storage: S, root_name: impl Into<String>) -> IdmResult<Self> {
        let stored = storage
            .list(REALM_COLLECTION)
            .await
            .map_err(|e| IdmError::Storage(e.into()))?;

        let mut candidates = BTreeMap::new();
        for (key, document) in stored {
            let node: RealmNode = serde_json::from_value(document)
                .map_err(|e| IdmError::Storage(StorageError::from(e)))?;
            debug!("Loaded realm {} ({})", node.full_path, key);
            if let Some(previous) = candidates.insert(node.full_path.clone(), node) {
                warn!("Duplicate realm {} ({}) replaced", previous.full_path, previous.key);
            }
        }

        let mut nodes: BTreeMap<RealmPath, RealmNode> = BTreeMap::new();
        if !candidates.contains_key(&RealmPath::root()) {
            let root = RealmNode::root(root_name);
            persist(&storage, &root).await?;
            candidates.insert(root.full_path.clone(), root);
        }

        // parents sort before their descendants
        for (path, node) in candidates {
            let attached = path.parent().is_none_or(|parent| {
                nodes
                    .get(&parent)
                    .is_some_and(|p| node.parent_key.as_deref() == Some(p.key.as_str()))
            });
            if attached {
                nodes.insert(path, node);
            } else {
                warn!("Skipping orphan realm {} ({})", path, node.key);
            }
        }

        info!("Loaded realm tree with {} realms", nodes.len());
        Ok(Self {
            nodes: RwLock::new(nodes),
            storage,
        })
    }

    /// Every realm, parents before children.
    pub async fn list(&self) -> Vec<RealmNode> {
        let nodes = self.nodes.read().await;
        debug!("Listing all {} realms", nodes.len());
        nodes.values().cloned().collect()
    }

    /// The realm at `path` followed by all of its descendants.
    pub async fn list_at(&self, path: &str) -> IdmResult<Vec<RealmNode>> {
        let path = address(path)?;
        let nodes = self.nodes.read().await;
        if !nodes.contains_key(&path) {
            return Err(IdmError::realm_not_found(path.as_str()));
        }

        debug!("Listing realms rooted at {}", path);
        Ok(subtree(&nodes, &path).into_iter().cloned().collect())
    }

    /// The realm at exactly `path`.
    pub async fn get(&self, path: &str) -> IdmResult<RealmNode> {
        let path = address(path)?;
        self.nodes
            .read()
            .await
            .get(&path)
            .cloned()
            .ok_or_else(|| IdmError::realm_not_found(path.as_str()))
    }

    /// Create a realm under `parent_path`.
    pub async fn create(&self, parent_path: &str, realm: NewRealm) -> IdmResult<RealmNode> {
        check_name(&realm.name)?;
        let parent_path = address(parent_path)?;

        let mut nodes = self.nodes.write().await;
        let parent = nodes
            .get(&parent_path)
            .ok_or_else(|| IdmError::realm_not_found(parent_path.as_str()))?;

        let full_path = parent_path.child(&realm.name).map_err(|e| {
            IdmError::violation(ViolationKind::InvalidRealm, "name", e.to_string())
        })?;
        if nodes.contains_key(&full_path) {
            return Err(IdmError::realm_conflict(full_path.as_str()));
        }

        let now = Utc::now();
        let node = RealmNode {
            key: uuid::Uuid::new_v4().to_string(),
            name: realm.name,
            full_path: full_path.clone(),
            parent_key: Some(parent.key.clone()),
            payload: realm.payload,
            created: now,
            last_modified: now,
        };

        persist(&self.storage, &node).await?;
        nodes.insert(full_path, node.clone());

        info!("Created realm {} ({})", node.full_path, node.key);
        Ok(node)
    }

    /// Replace the payload of the realm at `node.full_path`.
    ///
    /// Key, name and parent are taken from the stored realm, not from `node`.
    pub async fn update(&self, node: RealmNode) -> IdmResult<RealmNode> {
        let mut nodes = self.nodes.write().await;
        let current = nodes
            .get(&node.full_path)
            .ok_or_else(|| IdmError::realm_not_found(node.full_path.as_str()))?;

        let updated = RealmNode {
            payload: node.payload,
            last_modified: Utc::now(),
            ..current.clone()
        };

        persist(&self.storage, &updated).await?;
        nodes.insert(updated.full_path.clone(), updated.clone());

        info!("Updated realm {} ({})", updated.full_path, updated.key);
        Ok(updated)
    }

    /// Remove the realm at `path` together with all of its descendants.
    ///
    /// Returns the removed realms, the addressed realm first.
    pub async fn delete(&self, path: &str) -> IdmResult<Vec<RealmNode>> {
        let path = address(path)?;
        if path.is_root() {
            return Err(IdmError::violation(
                ViolationKind::InvalidRealm,
                "fullPath",
                "Root realm cannot be deleted",
            ));
        }

        let mut nodes = self.nodes.write().await;
        if !nodes.contains_key(&path) {
            return Err(IdmError::realm_not_found(path.as_str()));
        }

        let removed: Vec<RealmNode> = subtree(&nodes, &path).into_iter().cloned().collect();

        // children first, so a storage failure never strands an orphan
        for (done, node) in removed.iter().rev().enumerate() {
            let result = self
                .storage
                .delete(StorageKey::new(REALM_COLLECTION, node.key.clone()))
                .await;
            if let Err(e) = result {
                let error = IdmError::Storage(e.into());
                warn!("Deleting realm {} failed: {}", node.full_path, error);
                self.restore(&removed[removed.len() - done..]).await;
                return Err(error);
            }
        }
        for node in &removed {
            nodes.remove(&node.full_path);
        }

        info!(
            "Deleted realm {} and {} descendants",
            path,
            removed.len().saturating_sub(1)
        );
        Ok(removed)
    }

    /// Write back realms whose storage documents were already deleted, parents first.
    async fn restore(&self, deleted: &[RealmNode]) {
        for node in deleted {
            match persist(&self.storage, node).await {
                Ok(()) => debug!("Restored realm {} ({})", node.full_path, node.key),
                Err(e) => error!(
                    "Realm {} ({}) is gone from storage but still in memory: {}",
                    node.full_path, node.key, e
                ),
            }
        }
    }
}

/// The realm at `root` and its descendants, in path order.
fn subtree<'a>(nodes: &'a BTreeMap<RealmPath, RealmNode>, root: &RealmPath) -> Vec<&'a RealmNode> {
    if root.is_root() {
        return nodes.values().collect();
    }
    let (lower, upper) = root.descendant_bounds();
    let descendants = nodes
        .range::<str, _>((Bound::Included(lower.as_str()), Bound::Excluded(upper.as_str())))
        .map(|(_, node)| node);
    nodes.get(root).into_iter().chain(descendants).collect()
}

/// Malformed addresses cannot match any realm.
fn address(raw: &str) -> IdmResult<RealmPath> {
    RealmPath::parse(raw).map_err(|e| {
        debug!("{}", e);
        IdmError::realm_not_found(raw)
    })
}

fn check_name(name: &str) -> IdmResult<()> {
    let message = if name.trim().is_empty() {
        "Realm name cannot be empty"
    } else if name.contains(super::SEPARATOR) {
        "Realm name cannot contain the path separator"
    } else if contains_markup(name) {
        "Realm name cannot contain markup"
    } else {
        return Ok(());
    };
    Err(IdmError::violation(ViolationKind::InvalidRealm, "name", message))
}

async fn persist<S>(storage: &S, node: &RealmNode) -> IdmResult<()>
where
    S: StorageProvider,
    S::Error: Into<StorageError>,
{
    let document =
        serde_json::to_value(node).map_err(|e| IdmError::Storage(StorageError::from(e)))?;
    storage
        .put(StorageKey::new(REALM_COLLECTION, node.key.clone()), document)
        .await
        .map_err(|e| IdmError::Storage(e.into()))?;
    Ok(())
}
