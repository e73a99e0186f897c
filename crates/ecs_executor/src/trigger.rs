//! Event-driven scheduling: run a fixed group list whenever an event fires.

use std::sync::Arc;

use ecs_system::GroupRef;
use tracing::debug;

use crate::controller::ExecutionController;
use crate::error::ExecutionError;
use crate::queue::QueueOutcome;

/// Binds a group list to a controller. Every [`dispatch`](Self::dispatch)
/// creates a fresh queue for the event's payload and runs it.
pub struct GroupTrigger<D> {
    controller: Arc<ExecutionController<D>>,
    groups: Vec<GroupRef<D>>,
    name: Option<String>,
}

impl<D: Send + Sync + 'static> GroupTrigger<D> {
    /// A trigger that runs `groups` through `controller` on every dispatch.
    #[must_use]
    pub fn new(controller: Arc<ExecutionController<D>>, groups: Vec<GroupRef<D>>) -> Self {
        Self {
            controller,
            groups,
            name: None,
        }
    }

    /// Name the queues this trigger creates.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the controller queues are created on.
    #[must_use]
    pub fn controller(&self) -> &Arc<ExecutionController<D>> {
        &self.controller
    }

    /// Run the bound groups with `data`, using the controller's
    /// `allow_async` setting.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the run.
    pub async fn dispatch(&self, data: impl Into<Arc<D>>) -> Result<QueueOutcome, ExecutionError> {
        let id = match &self.name {
            Some(name) => self.controller.create_named(&self.groups, data, name.as_str()),
            None => self.controller.create(&self.groups, data),
        };
        debug!(queue = %id, groups = self.groups.len(), "trigger dispatched");
        self.controller.run_default(id).await
    }
}

impl<D> Clone for GroupTrigger<D> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            groups: self.groups.clone(),
            name: self.name.clone(),
        }
    }
}
