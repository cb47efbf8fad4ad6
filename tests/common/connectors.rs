//! Scripted resource connectors.
//!
//! A [`ScriptedConnector`] answers per resource key: succeed (the default), fail,
//! answer after a delay, or wait until the test releases it. Every contact is
//! recorded when it starts, and reported on a channel when it finishes.

use async_trait::async_trait;
use idm_core::propagation::{
    ContactError, ExternalResource, PropagationTask, ResourceConnector, ResourceOperation,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};

/// How the connector answers for one resource.
#[derive(Clone)]
pub enum Behavior {
    Succeed,
    Fail(String),
    Delay(Duration),
    /// Wait until the `Notify` is signalled
    Block(Arc<Notify>),
}

/// Finished contact: resource key and the operation it carried.
pub type Completion = (String, ResourceOperation);

pub struct ScriptedConnector {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<Vec<String>>,
    completed: mpsc::UnboundedSender<Completion>,
}

impl ScriptedConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (completed, receiver) = mpsc::unbounded_channel();
        let connector = Self {
            behaviors: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            completed,
        };
        (connector, receiver)
    }

    pub fn with(mut self, resource: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(resource.to_string(), behavior);
        self
    }

    /// Resource keys in the order their contact started.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceConnector for ScriptedConnector {
    async fn contact(
        &self,
        resource: &ExternalResource,
        task: &PropagationTask,
    ) -> Result<(), ContactError> {
        self.calls.lock().unwrap().push(resource.key.clone());

        let behavior = self
            .behaviors
            .get(&resource.key)
            .cloned()
            .unwrap_or(Behavior::Succeed);
        let result = match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(ContactError::Rejected { message }),
            Behavior::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Behavior::Block(release) => {
                release.notified().await;
                Ok(())
            }
        };

        let _ = self.completed.send((resource.key.clone(), task.operation));
        result
    }
}
