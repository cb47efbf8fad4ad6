//! Validation gate in front of mapping configuration storage.

use super::MappingConfiguration;
use super::resolver::CapabilityResolver;
use super::validator::{MappingValidator, ValidationOutcome};
use crate::error::{IdmError, IdmResult, Violation};
use crate::storage::{StorageError, StorageKey, StorageProvider};
use log::{info, warn};

/// Storage collection holding accepted mapping configurations.
pub const MAPPING_COLLECTION: &str = "mapping";

/// Decision taken by the [`ConfigValidationGate`] for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Configuration passed validation and was stored
    Accepted(MappingConfiguration),
    /// Configuration was not stored; carries every violation found
    Rejected(Vec<Violation>),
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted(_))
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            GateDecision::Accepted(_) => &[],
            GateDecision::Rejected(violations) => violations,
        }
    }
}

/// Only path from a submitted configuration to storage.
///
/// The storage handle is private to the gate, so no caller can persist a
/// configuration that has not been validated.
pub struct ConfigValidationGate<R, S> {
    validator: MappingValidator<R>,
    storage: S,
}

impl<R, S> ConfigValidationGate<R, S>
where
    R: CapabilityResolver,
    S: StorageProvider,
    S::Error: Into<StorageError>,
{
    pub fn new(validator: MappingValidator<R>, storage: S) -> Self {
        Self { validator, storage }
    }

    pub fn validator(&self) -> &MappingValidator<R> {
        &self.validator
    }

    /// Validate and, when valid, persist a configuration.
    ///
    /// Rejections are returned as `Ok(GateDecision::Rejected(..))`; `Err` is
    /// reserved for storage failures after a configuration was accepted.
    pub async fn submit(&self, config: MappingConfiguration) -> IdmResult<GateDecision> {
        match self.validator.validate(&config) {
            ValidationOutcome::Invalid(violations) => {
                warn!(
                    "Rejected mapping configuration '{}': {} violations",
                    config.key,
                    violations.len()
                );
                Ok(GateDecision::Rejected(violations))
            }
            ValidationOutcome::Valid => {
                let document = serde_json::to_value(&config)
                    .map_err(|e| IdmError::Storage(StorageError::from(e)))?;
                self.storage
                    .put(StorageKey::new(MAPPING_COLLECTION, config.key.clone()), document)
                    .await
                    .map_err(|e| IdmError::Storage(e.into()))?;

                info!("Accepted mapping configuration '{}'", config.key);
                Ok(GateDecision::Accepted(config))
            }
        }
    }

    /// Read back a stored configuration.
    pub async fn find(&self, key: &str) -> IdmResult<Option<MappingConfiguration>> {
        let stored = self
            .storage
            .get(StorageKey::new(MAPPING_COLLECTION, key))
            .await
            .map_err(|e| IdmError::Storage(e.into()))?;

        stored
            .map(|document| {
                serde_json::from_value(document).map_err(|e| IdmError::Storage(StorageError::from(e)))
            })
            .transpose()
    }
}
