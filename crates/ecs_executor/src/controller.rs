//! Execution controller: the registry of live queues.
//!
//! Queues are registered by [`ExecutionController::create`] and removed when
//! their run ends (completed, stopped or failed) or as soon as they are
//! stopped. Operations on unknown ids are silent no-ops, except
//! [`ExecutionController::run`], which fails with
//! [`ExecutionError::QueueNotFound`].

use std::sync::Arc;

use dashmap::DashMap;
use ecs_component::EntityStorage;
use ecs_system::{GroupRef, QueueId, Resolver, ServiceRegistry, SingletonCache};
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::error::ExecutionError;
use crate::queue::{ExecutionQueue, QueueOutcome, QueueStatus};

/// Creates, runs and steers execution queues over one entity storage.
pub struct ExecutionController<D> {
    config: ControllerConfig,
    storage: Arc<EntityStorage>,
    resolver: Arc<dyn Resolver>,
    cache: Arc<SingletonCache>,
    queues: DashMap<QueueId, Arc<ExecutionQueue<D>>>,
}

impl<D: Send + Sync + 'static> ExecutionController<D> {
    /// A controller with default config, an empty service registry and a
    /// fresh singleton cache.
    #[must_use]
    pub fn new(storage: Arc<EntityStorage>) -> Self {
        Self {
            config: ControllerConfig::default(),
            storage,
            resolver: Arc::new(ServiceRegistry::new()),
            cache: Arc::new(SingletonCache::new()),
            queues: DashMap::new(),
        }
    }

    /// Replace the controller config.
    #[must_use]
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve system dependencies through `resolver`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Share a singleton cache with other controllers.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<SingletonCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Returns the controller config.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the entity storage every queue filters against.
    #[must_use]
    pub fn storage(&self) -> &Arc<EntityStorage> {
        &self.storage
    }

    /// Returns the singleton cache groups and systems are resolved through.
    #[must_use]
    pub fn cache(&self) -> &Arc<SingletonCache> {
        &self.cache
    }

    /// Build and register a queue under the default name. The queue is not
    /// started.
    pub fn create(&self, groups: &[GroupRef<D>], data: impl Into<Arc<D>>) -> QueueId {
        let name = self.config.default_queue_name.clone();
        self.create_named(groups, data, name)
    }

    /// Build and register a named queue. The queue is not started.
    pub fn create_named(
        &self,
        groups: &[GroupRef<D>],
        data: impl Into<Arc<D>>,
        name: impl Into<String>,
    ) -> QueueId {
        let queue = ExecutionQueue::new(name, Arc::clone(&self.storage), Arc::clone(&self.resolver));
        queue.setup(groups, &data.into(), &self.cache);
        let id = queue.id();
        self.queues.insert(id, Arc::new(queue));
        debug!(queue = %id, live = self.queues.len(), "queue registered");
        id
    }

    /// Execute queue `id` and remove it once the run ends.
    ///
    /// Dropping the returned future also removes the queue, stopping it
    /// first if its run had not ended.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::QueueNotFound`] if `id` is not live, or the
    /// error that ended the run (see [`ExecutionQueue::execute`]).
    pub async fn run(&self, id: QueueId, async_allowed: bool) -> Result<QueueOutcome, ExecutionError> {
        let queue = self
            .queue(id)
            .ok_or(ExecutionError::QueueNotFound(id))?;
        let mut registration = Registration {
            queues: &self.queues,
            id,
            finished: false,
        };
        let result = queue.execute(async_allowed).await;
        registration.finished = true;
        result
    }

    /// [`run`](Self::run) with the configured `allow_async`.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn run_default(&self, id: QueueId) -> Result<QueueOutcome, ExecutionError> {
        self.run(id, self.config.allow_async).await
    }

    /// Create a queue under the default name and run it to the end.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run), except `QueueNotFound`.
    pub async fn create_and_run(
        &self,
        groups: &[GroupRef<D>],
        data: impl Into<Arc<D>>,
    ) -> Result<QueueOutcome, ExecutionError> {
        let id = self.create(groups, data);
        self.run_default(id).await
    }

    /// Stop queue `id` and drop it from the registry.
    pub fn stop(&self, id: QueueId) {
        if let Some((_, queue)) = self.queues.remove(&id) {
            queue.stop();
        }
    }

    /// Pause queue `id` at its next item boundary.
    pub fn pause(&self, id: QueueId) {
        if let Some(queue) = self.queue(id) {
            queue.pause();
        }
    }

    /// Resume queue `id` if it is paused.
    pub fn resume(&self, id: QueueId) {
        if let Some(queue) = self.queue(id) {
            queue.resume();
        }
    }

    /// Stop every live queue.
    pub fn stop_all(&self) {
        let ids = self.queue_ids();
        info!(count = ids.len(), "stopping all queues");
        for id in ids {
            self.stop(id);
        }
    }

    /// Pause every live queue.
    pub fn pause_all(&self) {
        for queue in self.live() {
            queue.pause();
        }
    }

    /// Resume every live queue.
    pub fn resume_all(&self) {
        for queue in self.live() {
            queue.resume();
        }
    }

    /// Returns `true` if queue `id` is live.
    #[must_use]
    pub fn has_queue(&self, id: QueueId) -> bool {
        self.queues.contains_key(&id)
    }

    /// Status of queue `id`, or `None` if it is not live.
    #[must_use]
    pub fn queue_status(&self, id: QueueId) -> Option<QueueStatus> {
        self.queue(id).map(|queue| queue.status())
    }

    /// Number of live queues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Returns `true` if no queue is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Ids of every live queue, in no particular order.
    #[must_use]
    pub fn queue_ids(&self) -> Vec<QueueId> {
        self.queues.iter().map(|entry| *entry.key()).collect()
    }

    /// Clone the handle out so no map guard is held while the queue runs.
    fn queue(&self, id: QueueId) -> Option<Arc<ExecutionQueue<D>>> {
        self.queues.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    fn live(&self) -> Vec<Arc<ExecutionQueue<D>>> {
        self.queues
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

/// Removes a queue from the registry when its run ends or is abandoned.
struct Registration<'a, D: Send + Sync + 'static> {
    queues: &'a DashMap<QueueId, Arc<ExecutionQueue<D>>>,
    id: QueueId,
    finished: bool,
}

impl<D: Send + Sync + 'static> Drop for Registration<'_, D> {
    fn drop(&mut self) {
        let Some((_, queue)) = self.queues.remove(&self.id) else {
            return;
        };
        if !self.finished {
            warn!(queue = %self.id, "queue run dropped before it ended");
            queue.stop();
        }
    }
}
