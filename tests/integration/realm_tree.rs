//! Realm addressing, conflicts and cascading deletes.

use crate::common::init_logging;
use crate::common::storage::FailingStorage;
use idm_core::realm::{NewRealm, REALM_COLLECTION, RealmTree};
use idm_core::storage::{InMemoryStorage, StorageKey, StorageProvider};
use idm_core::IdmError;
use serde_json::json;
use std::sync::Arc;

async fn populated() -> RealmTree<InMemoryStorage> {
    let tree = RealmTree::new(InMemoryStorage::new()).await.unwrap();
    tree.create("/", NewRealm::new("even")).await.unwrap();
    tree.create("/even", NewRealm::new("two")).await.unwrap();
    tree.create("/even/two", NewRealm::new("four")).await.unwrap();
    tree.create("/", NewRealm::new("odd")).await.unwrap();
    tree
}

#[tokio::test]
async fn test_same_full_path_conflicts() {
    init_logging();
    let tree = populated().await;

    let result = tree.create("even", NewRealm::new("two")).await;
    assert!(matches!(result, Err(IdmError::RealmConflict { ref path }) if path == "/even/two"));

    // same name under another parent is a different path
    assert!(tree.create("/odd", NewRealm::new("two")).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_creates_of_same_path_yield_one_conflict() {
    let tree = Arc::new(RealmTree::new(InMemoryStorage::new()).await.unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let tree = Arc::clone(&tree);
        handles.push(tokio::spawn(async move {
            tree.create("/", NewRealm::new("shared")).await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(IdmError::RealmConflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
async fn test_cascade_delete_removes_descendants() {
    let tree = populated().await;

    let removed = tree.delete("/even").await.unwrap();
    assert_eq!(removed.len(), 3);
    assert_eq!(removed[0].full_path.as_str(), "/even");

    for path in ["/even", "/even/two", "/even/two/four"] {
        assert!(matches!(tree.list_at(path).await, Err(IdmError::RealmNotFound { .. })));
    }
    assert!(tree.get("/odd").await.is_ok());
}

#[tokio::test]
async fn test_cascade_delete_removes_stored_realms() {
    let storage = InMemoryStorage::new();
    let tree = RealmTree::load(storage.clone(), "/").await.unwrap();
    tree.create("/", NewRealm::new("even")).await.unwrap();
    tree.create("/even", NewRealm::new("two")).await.unwrap();
    assert_eq!(storage.count(REALM_COLLECTION).await, 3);

    tree.delete("even").await.unwrap();
    assert_eq!(storage.count(REALM_COLLECTION).await, 1);
}

#[tokio::test]
async fn test_greedy_path_addressing() {
    let tree = populated().await;

    let deep = tree.list_at("even/two/four").await.unwrap();
    assert_eq!(deep.len(), 1);
    assert_eq!(deep[0].name, "four");

    let from_root: Vec<String> = tree
        .list_at("/")
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.full_path.to_string())
        .collect();
    assert_eq!(from_root, vec!["/", "/even", "/even/two", "/even/two/four", "/odd"]);
}

#[tokio::test]
async fn test_storage_failure_leaves_tree_unchanged() {
    let storage = FailingStorage::new();
    let tree = RealmTree::new(storage.clone()).await.unwrap();
    tree.create("/", NewRealm::new("even")).await.unwrap();
    let before = tree.list().await;

    storage.fail_writes(true);
    assert!(matches!(
        tree.create("/", NewRealm::new("odd")).await,
        Err(IdmError::Storage(_))
    ));
    let even = tree.get("/even").await.unwrap();
    assert!(matches!(
        tree.update(even.with_payload(json!({"x": 1}))).await,
        Err(IdmError::Storage(_))
    ));
    assert!(matches!(tree.delete("/even").await, Err(IdmError::Storage(_))));

    assert_eq!(tree.list().await, before);
}

#[tokio::test]
async fn test_failed_cascade_delete_restores_stored_realms() {
    let storage = FailingStorage::new();
    let tree = RealmTree::new(storage.clone()).await.unwrap();
    tree.create("/", NewRealm::new("even")).await.unwrap();
    let two = tree.create("/even", NewRealm::new("two")).await.unwrap();
    tree.create("/even/two", NewRealm::new("four")).await.unwrap();
    let before = tree.list().await;

    // "/even/two/four" and "/even/two" go, then "/even" fails
    storage.fail_deletes_after(2);
    assert!(matches!(tree.delete("/even").await, Err(IdmError::Storage(_))));

    assert_eq!(tree.list().await, before);
    assert!(
        storage
            .inner()
            .exists(StorageKey::new(REALM_COLLECTION, two.key.clone()))
            .await
            .unwrap()
    );
    assert_eq!(storage.inner().count(REALM_COLLECTION).await, 4);

    let reloaded = RealmTree::load(storage.clone(), "/").await.unwrap();
    assert_eq!(reloaded.list().await, before);
}

#[tokio::test]
async fn test_subtree_excludes_siblings_sharing_a_prefix() {
    let tree = populated().await;
    tree.create("/", NewRealm::new("even-x")).await.unwrap();
    tree.create("/", NewRealm::new("even0")).await.unwrap();

    let removed = tree.delete("/even").await.unwrap();
    let paths: Vec<&str> = removed.iter().map(|n| n.full_path.as_str()).collect();
    assert_eq!(paths, vec!["/even", "/even/two", "/even/two/four"]);
    assert!(tree.get("/even-x").await.is_ok());
    assert!(tree.get("/even0").await.is_ok());
}
