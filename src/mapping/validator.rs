//! Structural validation of mapping configurations.
//!
//! Request-level checks (key safety, unmatching flags) reject immediately, since
//! they indicate a malformed request. Mapping-level checks (connector object key
//! cardinality, password prohibition, transformer resolvability) are all evaluated
//! and every violation is reported, in that order.

use super::resolver::{CapabilityResolver, Resolution};
use super::{MappingConfiguration, contains_markup};
use crate::error::{ValidationRejection, Violation, ViolationKind};
use log::{debug, warn};

pub const KEY_FIELD: &str = "key";
pub const UNMATCHING_FIELD: &str = "selfRegUnmatching.createUnmatching";
pub const CONN_OBJECT_KEY_FIELD: &str = "connObjectKey.size";
pub const PASSWORD_FIELD: &str = "password.size";
pub const TRANSFORMER_FIELD: &str = "mappingItemTransformerClassName";

/// Result of validating one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    /// Ordered, non-empty list of violations
    Invalid(Vec<Violation>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationOutcome::Valid => &[],
            ValidationOutcome::Invalid(violations) => violations,
        }
    }

    /// Convert into a `Result`, carrying violations as a [`ValidationRejection`].
    pub fn into_result(self) -> Result<(), ValidationRejection> {
        match self {
            ValidationOutcome::Valid => Ok(()),
            ValidationOutcome::Invalid(violations) => Err(ValidationRejection::new(violations)),
        }
    }

    fn from_violations(violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(violations)
        }
    }
}

/// Validator for [`MappingConfiguration`] invariants.
///
/// Holds only its resolver; validation has no side effects besides logging, so
/// a single validator can be shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct MappingValidator<R> {
    resolver: R,
}

impl<R: CapabilityResolver> MappingValidator<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Validate a configuration against every invariant.
    pub fn validate(&self, config: &MappingConfiguration) -> ValidationOutcome {
        debug!(
            "Validating mapping configuration '{}' with {} items",
            config.key,
            config.items.len()
        );

        if let Some(violation) = Self::check_request(config) {
            warn!(
                "Mapping configuration '{}' rejected: {}",
                config.key, violation
            );
            return ValidationOutcome::Invalid(vec![violation]);
        }

        let violations: Vec<Violation> = Self::check_conn_object_key(config)
            .into_iter()
            .chain(Self::check_password(config))
            .chain(self.check_transformers(config))
            .collect();

        if !violations.is_empty() {
            warn!(
                "Mapping configuration '{}' rejected with {} violations",
                config.key,
                violations.len()
            );
        }

        ValidationOutcome::from_violations(violations)
    }

    fn check_request(config: &MappingConfiguration) -> Option<Violation> {
        if contains_markup(&config.key) {
            return Some(Violation::new(ViolationKind::InvalidKey, KEY_FIELD, "Invalid key"));
        }

        if config.self_reg_unmatching && config.create_unmatching {
            return Some(Violation::new(
                ViolationKind::Standard,
                UNMATCHING_FIELD,
                "Either selfRegUnmatching or createUnmatching, not both",
            ));
        }

        None
    }

    fn check_conn_object_key(config: &MappingConfiguration) -> Option<Violation> {
        // an empty mapping is accepted here
        if config.items.is_empty() {
            return None;
        }

        let conn_object_keys = config
            .items
            .iter()
            .filter(|item| item.conn_object_key)
            .count();
        (conn_object_keys != 1).then(|| {
            Violation::new(
                ViolationKind::InvalidMapping,
                CONN_OBJECT_KEY_FIELD,
                "Single ConnObjectKey mapping is required",
            )
        })
    }

    fn check_password(config: &MappingConfiguration) -> Option<Violation> {
        config.items.iter().any(|item| item.password).then(|| {
            Violation::new(
                ViolationKind::InvalidMapping,
                PASSWORD_FIELD,
                "No password mapping is allowed",
            )
        })
    }

    fn check_transformers(&self, config: &MappingConfiguration) -> Vec<Violation> {
        config
            .items
            .iter()
            .flat_map(|item| item.transformer_class_names.iter())
            .filter(|class_name| self.resolver.resolve(class_name) == Resolution::Unresolvable)
            .map(|class_name| {
                Violation::new(
                    ViolationKind::InvalidMapping,
                    TRANSFORMER_FIELD,
                    format!("Invalid mapping item transformer class name: {}", class_name),
                )
            })
            .collect()
    }
}
