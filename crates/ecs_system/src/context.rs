//! Per-run execution context handed to a system.

use std::fmt;
use std::sync::Arc;

use ecs_component::{ComponentFilter, EntityStorage, Filtered};
use uuid::Uuid;

use crate::cancel::CancellationToken;
use crate::inject::{ReadOnly, Services};

/// Identifies a system group (by default its type name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(Arc<str>);

impl GroupId {
    /// Create a group id.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one execution queue for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(Uuid);

impl QueueId {
    /// Allocate a fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for QueueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Everything a system sees during one run.
///
/// The context owns `Arc`s only, so asynchronous systems can move it into
/// the future they return.
pub struct SystemContext<D> {
    group: GroupId,
    queue: QueueId,
    storage: Arc<EntityStorage>,
    data: Arc<D>,
    filter: ComponentFilter,
    with_disabled: bool,
    services: Services,
    cancel: CancellationToken,
}

impl<D> SystemContext<D> {
    /// Assemble a context. Normally done by the execution queue.
    #[must_use]
    pub fn new(
        group: GroupId,
        queue: QueueId,
        storage: Arc<EntityStorage>,
        data: Arc<D>,
        filter: ComponentFilter,
        with_disabled: bool,
    ) -> Self {
        Self {
            group,
            queue,
            storage,
            data,
            filter,
            with_disabled,
            services: Services::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach the services bound for this run.
    #[must_use]
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Attach the owning queue's cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Group the running system was scheduled by.
    #[must_use]
    pub fn group_id(&self) -> &GroupId {
        &self.group
    }

    /// Queue the system is running in.
    #[must_use]
    pub fn queue_id(&self) -> QueueId {
        self.queue
    }

    /// The entity storage being filtered.
    #[must_use]
    pub fn storage(&self) -> &Arc<EntityStorage> {
        &self.storage
    }

    /// The caller data this run was scheduled with.
    #[must_use]
    pub fn data(&self) -> &D {
        &self.data
    }

    /// The caller data as a shared handle, for moving into futures.
    #[must_use]
    pub fn shared_data(&self) -> &Arc<D> {
        &self.data
    }

    /// The system's own filter merged with the invocation's extension.
    #[must_use]
    pub fn filter(&self) -> &ComponentFilter {
        &self.filter
    }

    /// Whether inactive entities are part of the filtered population.
    #[must_use]
    pub fn with_disabled(&self) -> bool {
        self.with_disabled
    }

    /// Entities matching [`SystemContext::filter`].
    #[must_use]
    pub fn entities(&self) -> Filtered {
        self.storage.filter(&self.filter, self.with_disabled)
    }

    /// Entities matching [`SystemContext::filter`] narrowed by `extra`.
    #[must_use]
    pub fn entities_matching(&self, extra: &ComponentFilter) -> Filtered {
        self.storage
            .filter(&self.filter.merged(extra), self.with_disabled)
    }

    /// Dependencies bound for this run.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Shorthand for a read-only view of a declared dependency.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(&self) -> Option<ReadOnly<T>> {
        self.services.read_only::<T>()
    }

    /// The queue's cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns `true` once the owning queue has been stopped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<D> Clone for SystemContext<D> {
    fn clone(&self) -> Self {
        Self {
            group: self.group.clone(),
            queue: self.queue,
            storage: Arc::clone(&self.storage),
            data: Arc::clone(&self.data),
            filter: self.filter.clone(),
            with_disabled: self.with_disabled,
            services: self.services.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<D> fmt::Debug for SystemContext<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemContext")
            .field("group", &self.group)
            .field("queue", &self.queue)
            .field("filter", &self.filter)
            .field("with_disabled", &self.with_disabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ecs_component::Component;

    use super::*;

    struct Position;
    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    struct Health;
    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    fn storage() -> Arc<EntityStorage> {
        let storage = EntityStorage::default();
        let a = storage.create_entity("a").with_component(Position).unwrap();
        let b = storage
            .create_entity("b")
            .with_component(Position)
            .and_then(|e| e.with_component(Health))
            .unwrap();
        storage.add_entity(a).unwrap();
        let b = storage.add_entity(b).unwrap();
        b.write().set_active(false);
        Arc::new(storage)
    }

    #[test]
    fn test_context_accessors() {
        let queue = QueueId::new();
        let ctx = SystemContext::new(
            GroupId::new("physics"),
            queue,
            storage(),
            Arc::new(42u32),
            ComponentFilter::new().with::<Position>(),
            false,
        );
        assert_eq!(ctx.group_id().as_str(), "physics");
        assert_eq!(ctx.queue_id(), queue);
        assert_eq!(*ctx.data(), 42);
        assert!(!ctx.with_disabled());
        assert!(!ctx.is_cancelled());
        assert!(ctx.services().is_empty());
    }

    #[test]
    fn test_entities_respect_filter_and_activity() {
        let ctx = SystemContext::new(
            GroupId::new("g"),
            QueueId::new(),
            storage(),
            Arc::new(()),
            ComponentFilter::new().with::<Position>(),
            false,
        );
        assert_eq!(ctx.entities().count(), 1);

        let ctx = SystemContext::new(
            GroupId::new("g"),
            QueueId::new(),
            ctx.storage().clone(),
            Arc::new(()),
            ComponentFilter::new().with::<Position>(),
            true,
        );
        assert_eq!(ctx.entities().count(), 2);
        let narrowed = ctx.entities_matching(&ComponentFilter::new().with::<Health>());
        assert_eq!(narrowed.ids(), vec!["b".into()]);
    }

    #[test]
    fn test_cancellation_is_shared_with_queue() {
        let token = CancellationToken::new();
        let ctx = SystemContext::new(
            GroupId::new("g"),
            QueueId::new(),
            storage(),
            Arc::new(()),
            ComponentFilter::new(),
            false,
        )
        .with_cancellation(token.clone());
        token.cancel();
        assert!(ctx.clone().is_cancelled());
    }

    #[test]
    fn test_queue_ids_are_unique() {
        assert_ne!(QueueId::new(), QueueId::new());
    }
}
