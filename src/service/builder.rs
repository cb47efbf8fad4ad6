//! Builder for [`ProvisioningService`].

use super::ProvisioningService;
use crate::config::ProvisioningConfig;
use crate::error::{BuildError, BuildResult};
use crate::mapping::{CapabilityResolver, ConfigValidationGate, MappingValidator, TypeRegistry};
use crate::propagation::{PropagationCoordinator, ResourceConnector};
use crate::realm::RealmTree;
use crate::storage::{StorageError, StorageProvider};
use log::info;
use std::sync::Arc;
use std::time::Duration;

/// Builder wiring storage, resolver, connector and configuration together.
///
/// The storage handle is cloned into the mapping gate and the realm tree, so it
/// must share its backing store across clones (as [`InMemoryStorage`] does).
///
/// ```rust
/// use idm_core::propagation::{ContactError, ExternalResource, PropagationTask, ResourceConnector};
/// use idm_core::service::ProvisioningServiceBuilder;
/// use idm_core::storage::InMemoryStorage;
///
/// struct Noop;
///
/// #[async_trait::async_trait]
/// impl ResourceConnector for Noop {
///     async fn contact(&self, _: &ExternalResource, _: &PropagationTask) -> Result<(), ContactError> {
///         Ok(())
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = ProvisioningServiceBuilder::new(InMemoryStorage::new())
///     .with_connector(Noop)
///     .with_base_url("https://idm.example.com")
///     .build()
///     .await?;
/// assert_eq!(service.config().base_url, "https://idm.example.com");
/// # Ok(())
/// # }
/// ```
///
/// [`InMemoryStorage`]: crate::storage::InMemoryStorage
pub struct ProvisioningServiceBuilder<R, S> {
    storage: S,
    resolver: R,
    connector: Option<Arc<dyn ResourceConnector>>,
    config: ProvisioningConfig,
}

impl<S> ProvisioningServiceBuilder<TypeRegistry, S>
where
    S: StorageProvider + Clone,
    S::Error: Into<StorageError>,
{
    /// Start from an empty [`TypeRegistry`] and the default configuration.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            resolver: TypeRegistry::new(),
            connector: None,
            config: ProvisioningConfig::default(),
        }
    }
}

impl<R, S> ProvisioningServiceBuilder<R, S>
where
    R: CapabilityResolver,
    S: StorageProvider + Clone,
    S::Error: Into<StorageError>,
{
    /// Use another resolver for transformer names.
    pub fn with_resolver<R2: CapabilityResolver>(
        self,
        resolver: R2,
    ) -> ProvisioningServiceBuilder<R2, S> {
        ProvisioningServiceBuilder {
            storage: self.storage,
            resolver,
            connector: self.connector,
            config: self.config,
        }
    }

    pub fn with_connector(mut self, connector: impl ResourceConnector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Use a connector that is also held elsewhere.
    pub fn with_shared_connector(mut self, connector: Arc<dyn ResourceConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_config(mut self, config: ProvisioningConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    pub fn with_contact_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_contact_timeout(timeout);
        self
    }

    /// Build the service, loading the realms already in storage.
    ///
    /// # Errors
    ///
    /// [`BuildError::MissingConnector`] when no connector was given,
    /// [`BuildError::InvalidConfiguration`] when the configuration does not validate,
    /// and [`BuildError::RealmLoad`] when the stored realms cannot be read.
    pub async fn build(self) -> BuildResult<ProvisioningService<R, S>> {
        self.config.validate()?;
        let connector = self.connector.ok_or(BuildError::MissingConnector)?;

        let gate = ConfigValidationGate::new(MappingValidator::new(self.resolver), self.storage.clone());
        let tree = RealmTree::load(self.storage, self.config.root_realm_name.clone())
            .await
            .map_err(BuildError::RealmLoad)?;
        let tree = Arc::new(tree);
        let coordinator = PropagationCoordinator::new(tree, connector, self.config);

        info!(
            "Provisioning service ready (base URL: {}, contact timeout: {:?})",
            coordinator.config().base_url,
            coordinator.config().contact_timeout()
        );
        Ok(ProvisioningService::new(gate, coordinator))
    }
}
