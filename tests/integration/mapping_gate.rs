//! Validation gate in front of mapping storage.

use crate::assert_violation;
use crate::common::fixtures;
use crate::common::init_logging;
use crate::common::storage::FailingStorage;
use idm_core::mapping::validator::PASSWORD_FIELD;
use idm_core::mapping::{
    ConfigValidationGate, GateDecision, MAPPING_COLLECTION, MappingItem, MappingValidator,
};
use idm_core::storage::{InMemoryStorage, StorageKey, StorageProvider};
use idm_core::{IdmError, ViolationKind};

#[tokio::test]
async fn test_accepted_configuration_is_stored() {
    init_logging();
    let storage = InMemoryStorage::new();
    let gate = ConfigValidationGate::new(MappingValidator::new(fixtures::resolver()), storage.clone());

    let config = fixtures::valid_mapping("google");
    let decision = gate.submit(config.clone()).await.unwrap();

    assert_eq!(decision, GateDecision::Accepted(config.clone()));
    assert_eq!(storage.count(MAPPING_COLLECTION).await, 1);
    assert_eq!(gate.find("google").await.unwrap(), Some(config));
}

#[tokio::test]
async fn test_rejected_configuration_leaves_storage_untouched() {
    let storage = InMemoryStorage::new();
    let gate = ConfigValidationGate::new(MappingValidator::new(fixtures::resolver()), storage.clone());

    let config = fixtures::valid_mapping("okta").with_item(MappingItem::new("password", "secret").password());
    let decision = gate.submit(config).await.unwrap();

    assert!(!decision.is_accepted());
    assert_violation!(decision.violations(), ViolationKind::InvalidMapping, PASSWORD_FIELD);
    assert!(
        !storage
            .exists(StorageKey::new(MAPPING_COLLECTION, "okta"))
            .await
            .unwrap()
    );
    assert_eq!(gate.find("okta").await.unwrap(), None);
}

#[tokio::test]
async fn test_rejected_update_keeps_previous_version() {
    let storage = InMemoryStorage::new();
    let gate = ConfigValidationGate::new(MappingValidator::new(fixtures::resolver()), storage);

    let original = fixtures::valid_mapping("google");
    gate.submit(original.clone()).await.unwrap();

    let broken = original
        .clone()
        .with_self_reg_unmatching(true)
        .with_create_unmatching(true);
    assert!(!gate.submit(broken).await.unwrap().is_accepted());

    assert_eq!(gate.find("google").await.unwrap(), Some(original));
}

#[tokio::test]
async fn test_storage_failure_is_an_error_not_a_rejection() {
    let storage = FailingStorage::new();
    storage.fail_writes(true);
    let gate = ConfigValidationGate::new(MappingValidator::new(fixtures::resolver()), storage);

    let result = gate.submit(fixtures::valid_mapping("google")).await;
    assert!(matches!(result, Err(IdmError::Storage(_))));
}
