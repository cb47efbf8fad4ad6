//! Service facade over the mapping gate and the realm coordinator.
//!
//! [`ProvisioningService`] is what a transport adapter talks to: it exposes
//! mapping submission and lookup, realm reads, and realm mutations with
//! propagation. Build one with [`ProvisioningServiceBuilder`].

pub mod builder;

pub use builder::ProvisioningServiceBuilder;

use crate::config::ProvisioningConfig;
use crate::error::IdmResult;
use crate::mapping::{
    CapabilityResolver, ConfigValidationGate, GateDecision, MappingConfiguration,
    ValidationOutcome,
};
use crate::propagation::{
    ExternalResource, PropagationCoordinator, RealmMutation, ResponsePreference, ShapedResponse,
};
use crate::realm::{RealmNode, RealmTree};
use crate::storage::{StorageError, StorageProvider};

/// Identity-management core: mapping validation and realm provisioning.
pub struct ProvisioningService<R, S> {
    gate: ConfigValidationGate<R, S>,
    coordinator: PropagationCoordinator<S>,
}

impl<R, S> ProvisioningService<R, S>
where
    R: CapabilityResolver,
    S: StorageProvider,
    S::Error: Into<StorageError>,
{
    pub(crate) fn new(gate: ConfigValidationGate<R, S>, coordinator: PropagationCoordinator<S>) -> Self {
        Self { gate, coordinator }
    }

    pub fn config(&self) -> &ProvisioningConfig {
        self.coordinator.config()
    }

    /// Check a configuration without storing it.
    pub fn validate_mapping(&self, config: &MappingConfiguration) -> ValidationOutcome {
        self.gate.validator().validate(config)
    }

    /// Validate a configuration and store it when valid.
    pub async fn submit_mapping(&self, config: MappingConfiguration) -> IdmResult<GateDecision> {
        self.gate.submit(config).await
    }

    pub async fn find_mapping(&self, key: &str) -> IdmResult<Option<MappingConfiguration>> {
        self.gate.find(key).await
    }

    /// Read access to the realm tree.
    pub fn realms(&self) -> &RealmTree<S> {
        self.coordinator.tree()
    }

    pub async fn list_realms(&self) -> Vec<RealmNode> {
        self.realms().list().await
    }

    /// The realm at `path` and its descendants.
    pub async fn list_realms_at(&self, path: &str) -> IdmResult<Vec<RealmNode>> {
        self.realms().list_at(path).await
    }

    /// Apply a realm mutation and propagate it; `Err` when the local mutation fails.
    pub async fn apply_realm_mutation(
        &self,
        mutation: RealmMutation,
        resources: &[ExternalResource],
        preference: ResponsePreference,
    ) -> IdmResult<ShapedResponse> {
        self.coordinator.apply(mutation, resources, preference).await
    }

    /// Apply a realm mutation and propagate it, shaping any error into the response.
    pub async fn handle_realm_mutation(
        &self,
        mutation: RealmMutation,
        resources: &[ExternalResource],
        preference: ResponsePreference,
    ) -> ShapedResponse {
        self.coordinator.handle(mutation, resources, preference).await
    }
}
