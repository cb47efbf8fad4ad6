//! Identity-management core library for Rust.
//!
//! Validates identity-provider mapping configurations before they are stored, and
//! maintains a hierarchical realm tree whose mutations are propagated to external
//! resources under client-selected response and propagation preferences.
//!
//! # Core Components
//!
//! - [`MappingValidator`] - Structural integrity rules for mapping configurations
//! - [`ConfigValidationGate`] - The only path from a configuration to storage
//! - [`RealmTree`] - Path-addressed organizational-unit tree
//! - [`PropagationCoordinator`] - Realm mutation with per-resource propagation
//! - [`ProvisioningService`] - Facade tying the above together
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use idm_core::propagation::{ContactError, ExternalResource, PropagationTask, ResourceConnector};
//! use idm_core::{NewRealm, ProvisioningServiceBuilder, RealmMutation, ResponsePreference};
//! use idm_core::storage::InMemoryStorage;
//!
//! struct Ldap;
//!
//! #[async_trait::async_trait]
//! impl ResourceConnector for Ldap {
//!     async fn contact(&self, _: &ExternalResource, _: &PropagationTask) -> Result<(), ContactError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ProvisioningServiceBuilder::new(InMemoryStorage::new())
//!     .with_connector(Ldap)
//!     .build()
//!     .await?;
//!
//! let response = service
//!     .apply_realm_mutation(
//!         RealmMutation::create("/", NewRealm::new("even")),
//!         &[ExternalResource::new("ldap").with_priority(0)],
//!         ResponsePreference::default(),
//!     )
//!     .await?;
//! assert!(response.is_success());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mapping;
pub mod propagation;
pub mod realm;
pub mod service;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::ProvisioningConfig;
pub use error::{BuildError, IdmError, IdmResult, ValidationRejection, Violation, ViolationKind};
pub use mapping::{
    CapabilityResolver, ConfigValidationGate, GateDecision, MappingConfiguration, MappingItem,
    MappingValidator, StaticResolver, TypeRegistry, ValidationOutcome,
};
pub use propagation::{
    ExternalResource, PropagationCoordinator, PropagationOutcome, PropagationStatus,
    ProvisioningResult, RealmMutation, ResourceConnector, ResponsePreference, ResponseStatus,
    ShapedResponse,
};
pub use realm::{NewRealm, RealmNode, RealmPath, RealmTree};
pub use service::{ProvisioningService, ProvisioningServiceBuilder};
