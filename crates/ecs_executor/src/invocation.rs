//! Invocation descriptors: one fully-resolved queue item.

use std::fmt;
use std::sync::Arc;

use ecs_component::ComponentFilter;
use ecs_system::{Condition, GroupId, QueueId, ScheduledSystem, System};

/// One scheduled run of a system inside an execution queue.
///
/// Built by flattening a group's sorted configs. A config with `repeat = n`
/// yields `n` consecutive invocations sharing the same settings.
pub struct Invocation<D> {
    /// Group the system was scheduled by.
    pub group_id: GroupId,
    /// Queue this invocation belongs to.
    pub execution_id: QueueId,
    pub system: Arc<dyn System<Data = D>>,
    /// Caller data handed to the system.
    pub data: Arc<D>,
    /// Filter extension from the config; merged with the system's own filter
    /// when the invocation runs.
    pub filter: ComponentFilter,
    pub with_disabled: bool,
    pub repeat: usize,
    pub can_execute: Condition,
    /// Position in the group's sorted order.
    pub order: u64,
}

impl<D: Send + Sync + 'static> Invocation<D> {
    /// Expand one scheduled config into its invocations. `queue_data` is
    /// used unless the config overrides it.
    pub(crate) fn expand(
        scheduled: ScheduledSystem<D>,
        group_id: &GroupId,
        execution_id: QueueId,
        queue_data: &Arc<D>,
    ) -> impl Iterator<Item = Self> + use<D> {
        let ScheduledSystem { order, config } = scheduled;
        let invocation = Self {
            group_id: group_id.clone(),
            execution_id,
            data: config.data.unwrap_or_else(|| Arc::clone(queue_data)),
            system: config.system,
            filter: config.filter,
            with_disabled: config.with_disabled,
            repeat: config.repeat.max(1),
            can_execute: config.can_execute,
            order,
        };
        std::iter::repeat_n(invocation, config.repeat.max(1))
    }

    /// Name of the system this invocation runs.
    #[must_use]
    pub fn system_name(&self) -> &str {
        self.system.name()
    }
}

impl<D> Clone for Invocation<D> {
    fn clone(&self) -> Self {
        Self {
            group_id: self.group_id.clone(),
            execution_id: self.execution_id,
            system: Arc::clone(&self.system),
            data: Arc::clone(&self.data),
            filter: self.filter.clone(),
            with_disabled: self.with_disabled,
            repeat: self.repeat,
            can_execute: Arc::clone(&self.can_execute),
            order: self.order,
        }
    }
}

impl<D: Send + Sync + 'static> fmt::Debug for Invocation<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("group_id", &self.group_id)
            .field("execution_id", &self.execution_id)
            .field("system", &self.system.name())
            .field("filter", &self.filter)
            .field("with_disabled", &self.with_disabled)
            .field("repeat", &self.repeat)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}
