//! Service configuration.
//!
//! `ProvisioningConfig` controls how created realms are addressed in responses and
//! how long the propagation coordinator waits for an external resource.

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for realm management and propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProvisioningConfig {
    /// Base URL used to build the `Location` of created realms.
    /// Examples: "https://idm.example.com", "https://api.company.com/rest"
    pub base_url: String,

    /// Deadline for a single external resource contact, in milliseconds.
    pub contact_timeout_ms: u64,

    /// Name given to the root realm.
    pub root_realm_name: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost".to_string(),
            contact_timeout_ms: 30_000,
            root_realm_name: "/".to_string(),
        }
    }
}

impl ProvisioningConfig {
    /// Parse a configuration document; missing fields take their defaults.
    pub fn from_json(document: &str) -> BuildResult<Self> {
        let config: Self = serde_json::from_str(document)
            .map_err(|e| BuildError::invalid_configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_contact_timeout(mut self, timeout: Duration) -> Self {
        self.contact_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_root_realm_name(mut self, name: impl Into<String>) -> Self {
        self.root_realm_name = name.into();
        self
    }

    /// Deadline applied to every external resource contact.
    pub fn contact_timeout(&self) -> Duration {
        Duration::from_millis(self.contact_timeout_ms)
    }

    /// URL of a realm, as reported in the `Location` of a created-realm response.
    pub fn realm_location(&self, full_path: &str) -> String {
        format!("{}/realms{}", self.base_url.trim_end_matches('/'), full_path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BuildResult<()> {
        if self.base_url.is_empty() {
            return Err(BuildError::invalid_configuration("Base URL cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(BuildError::invalid_configuration(
                "Base URL must start with http:// or https://",
            ));
        }

        if self.contact_timeout_ms == 0 {
            return Err(BuildError::invalid_configuration(
                "Contact timeout must be greater than zero",
            ));
        }

        if self.root_realm_name.trim().is_empty() {
            return Err(BuildError::invalid_configuration(
                "Root realm name cannot be empty",
            ));
        }

        Ok(())
    }
}
