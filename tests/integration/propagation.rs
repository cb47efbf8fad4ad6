//! Ordering, deadlines and failure isolation of propagation.

use crate::assert_status;
use crate::common::connectors::{Behavior, ScriptedConnector};
use crate::common::fixtures;
use crate::common::init_logging;
use crate::common::storage::FailingStorage;
use idm_core::propagation::{
    ExternalResource, PropagationStatus, RealmMutation, ResourceOperation, ResponsePreference,
    ResponseStatus,
};
use idm_core::realm::NewRealm;
use idm_core::storage::InMemoryStorage;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

const DEADLINE: Duration = Duration::from_millis(200);

fn create_even() -> RealmMutation {
    RealmMutation::create("/", NewRealm::new("even"))
}

#[tokio::test]
async fn test_async_null_priority_returns_pending_immediately() {
    init_logging();
    let release = Arc::new(Notify::new());
    let (connector, mut completions) = ScriptedConnector::new();
    let connector = Arc::new(connector.with("webhook", Behavior::Block(Arc::clone(&release))));
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), Duration::from_secs(5)).await;

    let resources = [
        ExternalResource::new("ldap").with_priority(0),
        ExternalResource::new("webhook"),
    ];
    let response = service
        .apply_realm_mutation(
            create_even(),
            &resources,
            ResponsePreference::default().with_null_priority_async(true),
        )
        .await
        .unwrap();

    assert_status!(response, ResponseStatus::CreatedWithContent);
    let body = response.body.unwrap();
    assert_eq!(body.outcome_for("ldap").unwrap().status, PropagationStatus::Success);
    assert_eq!(body.outcome_for("webhook").unwrap().status, PropagationStatus::Pending);

    // the detached contact is still running and finishes once released
    assert_eq!(completions.recv().await, Some(("ldap".to_string(), ResourceOperation::Create)));
    release.notify_one();
    assert_eq!(
        completions.recv().await,
        Some(("webhook".to_string(), ResourceOperation::Create))
    );
}

#[tokio::test]
async fn test_sync_null_priority_awaits_every_resource() {
    let (connector, _completions) = ScriptedConnector::new();
    let connector = Arc::new(
        connector
            .with("db", Behavior::Delay(Duration::from_millis(50)))
            .with("ws", Behavior::Delay(Duration::from_millis(50))),
    );
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), DEADLINE).await;

    let resources = [ExternalResource::new("db"), ExternalResource::new("ws")];
    let response = service
        .apply_realm_mutation(create_even(), &resources, ResponsePreference::default())
        .await
        .unwrap();

    let body = response.body.unwrap();
    let statuses: Vec<(&str, PropagationStatus)> = body
        .propagation_statuses
        .iter()
        .map(|o| (o.resource.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![("db", PropagationStatus::Success), ("ws", PropagationStatus::Success)]
    );
}

#[tokio::test]
async fn test_priority_resources_are_serial_and_ordered() {
    let (connector, _completions) = ScriptedConnector::new();
    let connector = Arc::new(connector.with("first", Behavior::Delay(Duration::from_millis(30))));
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), DEADLINE).await;

    let resources = [
        ExternalResource::new("third").with_priority(30),
        ExternalResource::new("unordered"),
        ExternalResource::new("first").with_priority(10),
        ExternalResource::new("second").with_priority(20),
    ];
    let response = service
        .apply_realm_mutation(create_even(), &resources, ResponsePreference::default())
        .await
        .unwrap();

    // "first" is slow, yet "second" only starts after it answered
    assert_eq!(connector.calls()[..3], ["first", "second", "third"]);
    let order: Vec<String> = response
        .body
        .unwrap()
        .propagation_statuses
        .into_iter()
        .map(|o| o.resource)
        .collect();
    assert_eq!(order, vec!["first", "second", "third", "unordered"]);
}

#[tokio::test]
async fn test_slow_resource_times_out_without_blocking_others() {
    let (connector, _completions) = ScriptedConnector::new();
    let connector = Arc::new(connector.with("slow", Behavior::Delay(Duration::from_secs(30))));
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), DEADLINE).await;

    let started = Instant::now();
    let resources = [
        ExternalResource::new("slow").with_priority(0),
        ExternalResource::new("fast").with_priority(1),
    ];
    let response = service
        .apply_realm_mutation(create_even(), &resources, ResponsePreference::default())
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    let body = response.body.unwrap();
    let slow = body.outcome_for("slow").unwrap();
    assert_eq!(slow.status, PropagationStatus::Failed);
    assert!(slow.failure_reason.as_deref().unwrap().contains("no answer within"));
    assert_eq!(body.outcome_for("fast").unwrap().status, PropagationStatus::Success);
}

#[tokio::test]
async fn test_partial_failure_keeps_local_mutation() {
    let (connector, _completions) = ScriptedConnector::new();
    let connector = Arc::new(connector.with("ldap", Behavior::Fail("schema violation".to_string())));
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), DEADLINE).await;

    let resources = [ExternalResource::new("ldap").with_priority(0), ExternalResource::new("db")];
    let response = service
        .apply_realm_mutation(create_even(), &resources, ResponsePreference::default())
        .await
        .unwrap();

    assert!(response.is_success());
    let body = response.body.unwrap();
    assert!(body.has_failures());
    let ldap = body.outcome_for("ldap").unwrap();
    assert!(ldap.failure_reason.as_deref().unwrap().contains("schema violation"));
    assert_eq!(body.outcome_for("db").unwrap().status, PropagationStatus::Success);
    assert!(service.realms().get("/even").await.is_ok());
}

#[tokio::test]
async fn test_no_content_still_propagates() {
    let (connector, _completions) = ScriptedConnector::new();
    let connector = Arc::new(connector);
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), DEADLINE).await;
    service
        .apply_realm_mutation(create_even(), &[], ResponsePreference::default())
        .await
        .unwrap();

    let mut even = service.realms().get("/even").await.unwrap();
    even.payload = json!({"passwordPolicy": "strict"});
    let response = service
        .apply_realm_mutation(
            RealmMutation::Update(even),
            &[ExternalResource::new("ldap").with_priority(0)],
            ResponsePreference::return_no_content(),
        )
        .await
        .unwrap();

    assert_status!(response, ResponseStatus::UpdatedNoContent);
    assert!(response.body.is_none());
    assert_eq!(connector.calls(), vec!["ldap"]);
}

#[tokio::test]
async fn test_delete_with_no_content() {
    let (connector, mut completions) = ScriptedConnector::new();
    let connector = Arc::new(connector);
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), DEADLINE).await;
    service.realms().create("/", NewRealm::new("even")).await.unwrap();

    let response = service
        .apply_realm_mutation(
            RealmMutation::delete("/even"),
            &[ExternalResource::new("ldap").with_priority(0)],
            ResponsePreference::return_no_content(),
        )
        .await
        .unwrap();

    assert_status!(response, ResponseStatus::DeletedNoContent);
    assert!(response.body.is_none());
    assert!(response.metadata.location.is_none());
    assert_eq!(completions.recv().await, Some(("ldap".to_string(), ResourceOperation::Delete)));
    assert!(service.realms().get("/even").await.is_err());
}

#[tokio::test]
async fn test_async_mode_with_only_unprioritized_resources() {
    let release_db = Arc::new(Notify::new());
    let release_ws = Arc::new(Notify::new());
    let (connector, mut completions) = ScriptedConnector::new();
    let connector = Arc::new(
        connector
            .with("db", Behavior::Block(Arc::clone(&release_db)))
            .with("ws", Behavior::Block(Arc::clone(&release_ws))),
    );
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), Duration::from_secs(5)).await;

    let resources = [ExternalResource::new("db"), ExternalResource::new("ws")];
    let response = service
        .apply_realm_mutation(
            create_even(),
            &resources,
            ResponsePreference::default().with_null_priority_async(true),
        )
        .await
        .unwrap();

    let body = response.body.unwrap();
    let statuses: Vec<(&str, PropagationStatus)> = body
        .propagation_statuses
        .iter()
        .map(|o| (o.resource.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![("db", PropagationStatus::Pending), ("ws", PropagationStatus::Pending)]
    );
    assert!(service.realms().get("/even").await.is_ok());

    // both contacts are still running in the background
    release_db.notify_one();
    release_ws.notify_one();
    let mut finished = vec![completions.recv().await.unwrap().0, completions.recv().await.unwrap().0];
    finished.sort();
    assert_eq!(finished, vec!["db", "ws"]);
}

#[tokio::test]
async fn test_delete_propagates_subtree_root() {
    let (connector, mut completions) = ScriptedConnector::new();
    let connector = Arc::new(connector);
    let service = fixtures::service_with(InMemoryStorage::new(), Arc::clone(&connector), DEADLINE).await;
    service.realms().create("/", NewRealm::new("even")).await.unwrap();
    service.realms().create("/even", NewRealm::new("two")).await.unwrap();

    let response = service
        .apply_realm_mutation(
            RealmMutation::delete("/even"),
            &[ExternalResource::new("ldap").with_priority(0)],
            ResponsePreference::return_content(),
        )
        .await
        .unwrap();

    assert_status!(response, ResponseStatus::DeletedWithContent);
    assert_eq!(response.body.unwrap().entity.full_path.as_str(), "/even");
    assert_eq!(completions.recv().await, Some(("ldap".to_string(), ResourceOperation::Delete)));
    assert!(service.list_realms_at("/even/two").await.is_err());
}

#[tokio::test]
async fn test_local_failure_aborts_before_propagation() {
    let storage = FailingStorage::new();
    let (connector, _completions) = ScriptedConnector::new();
    let connector = Arc::new(connector);
    let service = fixtures::service_with(storage.clone(), Arc::clone(&connector), DEADLINE).await;

    storage.fail_writes(true);
    let response = service
        .handle_realm_mutation(
            create_even(),
            &[ExternalResource::new("ldap").with_priority(0), ExternalResource::new("db")],
            ResponsePreference::default(),
        )
        .await;

    assert_status!(response, ResponseStatus::Failed { .. });
    assert!(connector.calls().is_empty());
    assert_eq!(service.list_realms().await.len(), 1);
}
