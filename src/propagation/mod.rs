//! Propagation of realm mutations to external resources.
//!
//! After a realm mutation is applied locally, the [`PropagationCoordinator`]
//! sends it to every external resource involved and collects one
//! [`PropagationOutcome`] per resource:
//!
//! - resources with a priority are contacted one at a time, lowest priority value
//!   first, each awaited before the next;
//! - resources without a priority are contacted concurrently, and either awaited
//!   or left running in the background when the client asked for
//!   null-priority-async propagation, in which case they are reported `Pending`.
//!
//! A resource that fails or exceeds the contact deadline yields a `Failed` outcome;
//! it never aborts propagation to the others, and the local mutation stays applied.

pub mod coordinator;
pub mod preference;
pub mod response;

pub use coordinator::PropagationCoordinator;
pub use preference::{Preference, ResponsePreference};
pub use response::{ResponseMetadata, ResponseStatus, ShapedResponse};

use crate::realm::{NewRealm, RealmNode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Handle of an external resource a realm is propagated to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalResource {
    pub key: String,
    /// Lower values are contacted first; `None` means no ordering constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl ExternalResource {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn is_prioritized(&self) -> bool {
        self.priority.is_some()
    }
}

/// Kind of change sent to external resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ResourceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceOperation::Create => f.write_str("CREATE"),
            ResourceOperation::Update => f.write_str("UPDATE"),
            ResourceOperation::Delete => f.write_str("DELETE"),
        }
    }
}

/// Realm mutation requested by a client.
#[derive(Debug, Clone, PartialEq)]
pub enum RealmMutation {
    /// Create `realm` below the realm at `parent_path`
    Create { parent_path: String, realm: NewRealm },
    /// Replace the payload of the realm at the node's full path
    Update(RealmNode),
    /// Delete the realm at `path` and all of its descendants
    Delete { path: String },
}

impl RealmMutation {
    pub fn create(parent_path: impl Into<String>, realm: NewRealm) -> Self {
        Self::Create {
            parent_path: parent_path.into(),
            realm,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::Delete { path: path.into() }
    }

    pub fn operation(&self) -> ResourceOperation {
        match self {
            RealmMutation::Create { .. } => ResourceOperation::Create,
            RealmMutation::Update(_) => ResourceOperation::Update,
            RealmMutation::Delete { .. } => ResourceOperation::Delete,
        }
    }
}

/// What is sent to each external resource: the applied change and the realm it
/// concerns. For deletions the realm is the root of the removed subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationTask {
    pub operation: ResourceOperation,
    pub realm: RealmNode,
}

/// Failure reported by a [`ResourceConnector`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    /// The resource answered but refused the change
    #[error("resource rejected the change: {message}")]
    Rejected { message: String },

    /// The resource could not be reached
    #[error("resource unreachable: {message}")]
    Unreachable { message: String },

    /// No answer within the contact deadline
    #[error("no answer within {after:?}")]
    TimedOut { after: Duration },
}

/// Remote call delivering a [`PropagationTask`] to one external resource.
///
/// Implementations may be slow and may fail; the coordinator applies deadlines
/// and converts every failure into a per-resource outcome.
#[async_trait]
pub trait ResourceConnector: Send + Sync {
    async fn contact(
        &self,
        resource: &ExternalResource,
        task: &PropagationTask,
    ) -> Result<(), ContactError>;
}

/// Status of the propagation to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropagationStatus {
    Success,
    Failed,
    /// Dispatched without waiting for the answer
    Pending,
}

/// Outcome of the propagation to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationOutcome {
    pub resource: String,
    pub status: PropagationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl PropagationOutcome {
    pub fn success(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            status: PropagationStatus::Success,
            failure_reason: None,
        }
    }

    pub fn failed(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            status: PropagationStatus::Failed,
            failure_reason: Some(reason.into()),
        }
    }

    pub fn pending(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            status: PropagationStatus::Pending,
            failure_reason: None,
        }
    }
}

/// Mutated entity enriched with propagation outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningResult<T> {
    pub entity: T,
    pub propagation_statuses: Vec<PropagationOutcome>,
}

impl<T> ProvisioningResult<T> {
    pub fn new(entity: T, propagation_statuses: Vec<PropagationOutcome>) -> Self {
        Self {
            entity,
            propagation_statuses,
        }
    }

    /// Outcome recorded for a given resource.
    pub fn outcome_for(&self, resource: &str) -> Option<&PropagationOutcome> {
        self.propagation_statuses
            .iter()
            .find(|outcome| outcome.resource == resource)
    }

    pub fn has_failures(&self) -> bool {
        self.propagation_statuses
            .iter()
            .any(|outcome| outcome.status == PropagationStatus::Failed)
    }
}
