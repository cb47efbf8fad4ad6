//! Error types for identity-management operations.
//!
//! This module provides the crate-level error enum, the structured validation
//! violations reported back to callers, and the errors raised while building a
//! service from configuration.

use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for identity-management operations.
///
/// Validation and addressing errors are recoverable by the caller; storage and
/// internal errors are fatal to the request that raised them.
#[derive(Debug, thiserror::Error)]
pub enum IdmError {
    /// Input rejected by one or more structural invariants
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationRejection),

    /// No realm exists at the addressed path
    #[error("Realm not found: {path}")]
    RealmNotFound { path: String },

    /// A realm already exists at the resulting path
    #[error("Realm already exists: {path}")]
    RealmConflict { path: String },

    /// Failure in the persistence collaborator
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Category of a validation violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Key contains markup or script content
    InvalidKey,
    /// Generic constraint, such as mutually exclusive flags
    Standard,
    /// Mapping item content breaks a mapping rule
    InvalidMapping,
    /// Realm name or path is not acceptable
    InvalidRealm,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::InvalidKey => "InvalidKey",
            ViolationKind::Standard => "Standard",
            ViolationKind::InvalidMapping => "InvalidMapping",
            ViolationKind::InvalidRealm => "InvalidRealm",
        };
        f.write_str(name)
    }
}

/// A single broken invariant, with enough structure for the caller to fix its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Property path the violation is attached to (e.g. `connObjectKey.size`)
    pub field: String,
    /// Violation category
    pub kind: ViolationKind,
    /// Human readable explanation
    pub message: String,
}

impl Violation {
    /// Create a violation on the given field.
    pub fn new(kind: ViolationKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{} ({})", self.kind, self.message, self.field)
    }
}

/// Ordered, non-empty list of violations that caused a rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRejection {
    pub violations: Vec<Violation>,
}

impl ValidationRejection {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Rejection carrying exactly one violation.
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    /// Whether any violation is of the given kind.
    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    /// Whether any violation is attached to the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        f.write_str(&messages.join(", "))
    }
}

impl std::error::Error for ValidationRejection {}

/// Errors that can occur while building a service or loading its configuration.
///
/// These are programming or deployment errors and should surface at startup.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No resource connector was supplied to the builder
    #[error("Resource connector is required but not provided")]
    MissingConnector,

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Realms already in storage could not be loaded
    #[error("Failed to load realms: {0}")]
    RealmLoad(#[source] IdmError),
}

impl IdmError {
    /// Create a realm not found error
    pub fn realm_not_found(path: impl Into<String>) -> Self {
        Self::RealmNotFound { path: path.into() }
    }

    /// Create a realm conflict error
    pub fn realm_conflict(path: impl Into<String>) -> Self {
        Self::RealmConflict { path: path.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Rejection carrying a single violation.
    pub fn violation(kind: ViolationKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationRejection::single(Violation::new(kind, field, message)))
    }
}

impl BuildError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

pub type IdmResult<T> = Result<T, IdmError>;
pub type BuildResult<T> = Result<T, BuildError>;
