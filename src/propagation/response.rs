//! Response shaping for realm mutations.
//!
//! A [`ShapedResponse`] is transport-neutral: a status, an optional body and the
//! metadata a transport adapter turns into headers. Errors are shaped here too, so
//! callers of `handle` always get a response back.

use super::preference::{self, Preference, ResponsePreference};
use super::{ProvisioningResult, ResourceOperation};
use crate::config::ProvisioningConfig;
use crate::error::{IdmError, Violation};
use crate::realm::RealmNode;
use log::{debug, warn};

/// Outcome category of a realm mutation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    CreatedWithContent,
    CreatedNoContent,
    UpdatedWithContent,
    UpdatedNoContent,
    DeletedWithContent,
    DeletedNoContent,
    NotFound,
    Conflict,
    ValidationRejected(Vec<Violation>),
    /// Storage or internal failure; nothing was propagated
    Failed { message: String },
}

impl ResponseStatus {
    fn for_operation(operation: ResourceOperation, preference: Preference) -> Self {
        let content = preference == Preference::ReturnContent;
        match (operation, content) {
            (ResourceOperation::Create, true) => ResponseStatus::CreatedWithContent,
            (ResourceOperation::Create, false) => ResponseStatus::CreatedNoContent,
            (ResourceOperation::Update, true) => ResponseStatus::UpdatedWithContent,
            (ResourceOperation::Update, false) => ResponseStatus::UpdatedNoContent,
            (ResourceOperation::Delete, true) => ResponseStatus::DeletedWithContent,
            (ResourceOperation::Delete, false) => ResponseStatus::DeletedNoContent,
        }
    }

    /// Whether the mutation was applied.
    pub fn is_success(&self) -> bool {
        !matches!(
            self,
            ResponseStatus::NotFound
                | ResponseStatus::Conflict
                | ResponseStatus::ValidationRejected(_)
                | ResponseStatus::Failed { .. }
        )
    }

    pub fn is_no_content(&self) -> bool {
        matches!(
            self,
            ResponseStatus::CreatedNoContent
                | ResponseStatus::UpdatedNoContent
                | ResponseStatus::DeletedNoContent
        )
    }
}

/// Response metadata, rendered as headers by [`ResponseMetadata::headers`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseMetadata {
    /// Key generated for a created realm
    pub resource_key: Option<String>,
    /// URL of a created realm
    pub location: Option<String>,
    /// Content preference honored, echoed only when the client declared one
    pub preference_applied: Option<Preference>,
    pub request_id: String,
}

impl ResponseMetadata {
    /// Header name/value pairs for the populated fields.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if let Some(location) = &self.location {
            headers.push((preference::LOCATION, location.clone()));
        }
        if let Some(key) = &self.resource_key {
            headers.push((preference::RESOURCE_KEY, key.clone()));
        }
        if let Some(applied) = self.preference_applied {
            headers.push((preference::PREFERENCE_APPLIED, applied.to_string()));
        }
        headers
    }
}

/// Final response of a realm mutation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedResponse {
    pub status: ResponseStatus,
    /// `None` for no-content responses and errors
    pub body: Option<ProvisioningResult<RealmNode>>,
    pub metadata: ResponseMetadata,
}

impl ShapedResponse {
    /// Shape a successful mutation according to the client preference.
    pub(crate) fn shape(
        operation: ResourceOperation,
        result: ProvisioningResult<RealmNode>,
        preference: ResponsePreference,
        config: &ProvisioningConfig,
        request_id: String,
    ) -> Self {
        let status = ResponseStatus::for_operation(operation, preference.content());

        let (resource_key, location) = if operation == ResourceOperation::Create {
            (
                Some(result.entity.key.clone()),
                Some(config.realm_location(result.entity.full_path.as_str())),
            )
        } else {
            (None, None)
        };

        let body = preference.returns_content().then_some(result);

        debug!(
            "Shaped {} response as {:?} (request: '{}')",
            operation, status, request_id
        );

        Self {
            status,
            body,
            metadata: ResponseMetadata {
                resource_key,
                location,
                preference_applied: preference.prefer,
                request_id,
            },
        }
    }

    /// Shape an error raised while applying a mutation.
    pub fn from_error(error: IdmError, request_id: String) -> Self {
        let status = match error {
            IdmError::RealmNotFound { .. } => ResponseStatus::NotFound,
            IdmError::RealmConflict { .. } => ResponseStatus::Conflict,
            IdmError::Validation(rejection) => {
                ResponseStatus::ValidationRejected(rejection.violations)
            }
            other => {
                warn!("Realm mutation failed (request: '{}'): {}", request_id, other);
                ResponseStatus::Failed {
                    message: other.to_string(),
                }
            }
        };

        Self {
            status,
            body: None,
            metadata: ResponseMetadata {
                request_id,
                ..ResponseMetadata::default()
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
