//! Applies realm mutations and propagates them to external resources.

use super::preference::ResponsePreference;
use super::response::ShapedResponse;
use super::{
    ContactError, ExternalResource, PropagationOutcome, PropagationStatus, PropagationTask,
    ProvisioningResult, RealmMutation, ResourceConnector, ResourceOperation,
};
use crate::config::ProvisioningConfig;
use crate::error::{IdmError, IdmResult};
use crate::realm::{RealmNode, RealmTree};
use crate::storage::{StorageError, StorageProvider};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Coordinates one realm mutation: local change first, then propagation.
///
/// The local mutation completes before any resource is contacted; if it fails,
/// nothing is propagated. Resource failures never undo the local mutation.
pub struct PropagationCoordinator<S> {
    tree: Arc<RealmTree<S>>,
    connector: Arc<dyn ResourceConnector>,
    config: ProvisioningConfig,
}

impl<S> PropagationCoordinator<S>
where
    S: StorageProvider,
    S::Error: Into<StorageError>,
{
    pub fn new(
        tree: Arc<RealmTree<S>>,
        connector: Arc<dyn ResourceConnector>,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            tree,
            connector,
            config,
        }
    }

    pub fn tree(&self) -> &Arc<RealmTree<S>> {
        &self.tree
    }

    pub fn config(&self) -> &ProvisioningConfig {
        &self.config
    }

    /// Apply `mutation`, propagate it to `resources` and shape the response.
    ///
    /// Returns `Err` only when the local mutation fails.
    pub async fn apply(
        &self,
        mutation: RealmMutation,
        resources: &[ExternalResource],
        preference: ResponsePreference,
    ) -> IdmResult<ShapedResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.execute(mutation, resources, preference, request_id)
            .await
    }

    /// Like [`apply`](Self::apply), with errors shaped into the response.
    pub async fn handle(
        &self,
        mutation: RealmMutation,
        resources: &[ExternalResource],
        preference: ResponsePreference,
    ) -> ShapedResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        match self
            .execute(mutation, resources, preference, request_id.clone())
            .await
        {
            Ok(response) => response,
            Err(error) => ShapedResponse::from_error(error, request_id),
        }
    }

    async fn execute(
        &self,
        mutation: RealmMutation,
        resources: &[ExternalResource],
        preference: ResponsePreference,
        request_id: String,
    ) -> IdmResult<ShapedResponse> {
        info!(
            "Realm {} requested for {} resources (request: '{}')",
            mutation.operation(),
            resources.len(),
            request_id
        );

        let (operation, realm) = self.mutate(mutation).await?;
        let task = PropagationTask { operation, realm };
        let outcomes = self
            .propagate(&task, resources, preference.null_priority_async)
            .await;

        let failed = outcomes
            .iter()
            .filter(|o| o.status == PropagationStatus::Failed)
            .count();
        info!(
            "Realm {} on {} propagated: {} outcomes, {} failed (request: '{}')",
            operation,
            task.realm.full_path,
            outcomes.len(),
            failed,
            request_id
        );

        let result = ProvisioningResult::new(task.realm, outcomes);
        Ok(ShapedResponse::shape(
            operation,
            result,
            preference,
            &self.config,
            request_id,
        ))
    }

    async fn mutate(&self, mutation: RealmMutation) -> IdmResult<(ResourceOperation, RealmNode)> {
        match mutation {
            RealmMutation::Create { parent_path, realm } => {
                let created = self.tree.create(&parent_path, realm).await?;
                Ok((ResourceOperation::Create, created))
            }
            RealmMutation::Update(node) => {
                let updated = self.tree.update(node).await?;
                Ok((ResourceOperation::Update, updated))
            }
            RealmMutation::Delete { path } => {
                let removed = self.tree.delete(&path).await?;
                let root = removed
                    .into_iter()
                    .next()
                    .ok_or_else(|| IdmError::internal("Delete removed no realm"))?;
                Ok((ResourceOperation::Delete, root))
            }
        }
    }

    /// Contact every resource and collect one outcome each.
    ///
    /// Prioritized resources come first, in ascending priority; resources sharing
    /// a priority keep their given order. The others follow in their given order.
    pub async fn propagate(
        &self,
        task: &PropagationTask,
        resources: &[ExternalResource],
        null_priority_async: bool,
    ) -> Vec<PropagationOutcome> {
        let deadline = self.config.contact_timeout();
        let (mut prioritized, unprioritized): (Vec<&ExternalResource>, Vec<&ExternalResource>) =
            resources.iter().partition(|r| r.is_prioritized());
        prioritized.sort_by_key(|r| r.priority);

        let mut outcomes = Vec::with_capacity(resources.len());
        for resource in prioritized {
            let outcome = contact(self.connector.as_ref(), resource, task, deadline).await;
            outcomes.push(outcome);
        }

        if unprioritized.is_empty() {
            return outcomes;
        }

        let shared_task = Arc::new(task.clone());
        if null_priority_async {
            for resource in unprioritized {
                outcomes.push(PropagationOutcome::pending(&resource.key));
                let connector = Arc::clone(&self.connector);
                let task = Arc::clone(&shared_task);
                let resource = resource.clone();
                tokio::spawn(async move {
                    let outcome = contact(connector.as_ref(), &resource, &task, deadline).await;
                    info!(
                        "Detached {} propagation to {} finished: {:?}",
                        task.operation, outcome.resource, outcome.status
                    );
                });
            }
            return outcomes;
        }

        let mut units = Vec::with_capacity(unprioritized.len());
        for resource in unprioritized {
            let connector = Arc::clone(&self.connector);
            let task = Arc::clone(&shared_task);
            let owned = resource.clone();
            let handle = tokio::spawn(async move {
                contact(connector.as_ref(), &owned, &task, deadline).await
            });
            units.push((resource.key.clone(), handle));
        }

        for (key, handle) in units {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    warn!("Propagation unit for {} aborted: {}", key, join_error);
                    PropagationOutcome::failed(key, format!("propagation aborted: {}", join_error))
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// One contact attempt bounded by `deadline`, folded into an outcome.
async fn contact(
    connector: &dyn ResourceConnector,
    resource: &ExternalResource,
    task: &PropagationTask,
    deadline: Duration,
) -> PropagationOutcome {
    debug!(
        "Contacting {} for {} of realm {}",
        resource.key, task.operation, task.realm.full_path
    );

    let result = match tokio::time::timeout(deadline, connector.contact(resource, task)).await {
        Ok(result) => result,
        Err(_) => Err(ContactError::TimedOut { after: deadline }),
    };

    match result {
        Ok(()) => PropagationOutcome::success(&resource.key),
        Err(error) => {
            warn!(
                "Propagation of {} on {} to {} failed: {}",
                task.operation, task.realm.full_path, resource.key, error
            );
            PropagationOutcome::failed(&resource.key, error.to_string())
        }
    }
}
