//! Execution queue: a flattened, pausable, stoppable run of invocations.
//!
//! `setup` flattens the sorted systems of every group into one FIFO, in the
//! order the groups were supplied. `execute` drains it one item at a time:
//!
//! 1. Wait while paused (a stop releases the wait).
//! 2. Terminate if the queue has been stopped.
//! 3. Skip the item if its `can_execute` guard returns `false`.
//! 4. Bind dependencies, build the context and run the system.
//! 5. Await a pending result, racing it against the stop signal.
//!
//! Pausing only takes effect between items. Stopping drops every pending
//! item, calls the running system's `force_stop` hook and aborts any
//! in-flight wait; `execute` then returns [`QueueOutcome::Stopped`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ecs_component::EntityStorage;
use ecs_system::{
    CancellationToken, Execution, GroupRef, InjectionScope, QueueId, Resolver, SingletonCache,
    System, SystemContext, bind,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ExecutionError;
use crate::invocation::Invocation;

/// How a queue run ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// Every item was processed.
    Completed,
    /// The queue was stopped before it drained.
    Stopped,
}

/// Snapshot of a live queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    pub id: QueueId,
    pub name: String,
    /// Whether the queue will hold at its next item boundary.
    pub is_paused: bool,
    /// Items not yet dequeued.
    pub pending: usize,
}

/// Why the drain loop left early. `Stopped` is the stop sentinel and never
/// leaves [`ExecutionQueue::execute`].
enum Interrupt {
    Stopped,
    Failed(ExecutionError),
}

impl From<ExecutionError> for Interrupt {
    fn from(err: ExecutionError) -> Self {
        Self::Failed(err)
    }
}

/// A queue of invocations drawn from one or more groups sharing caller data.
pub struct ExecutionQueue<D> {
    id: QueueId,
    name: String,
    storage: Arc<EntityStorage>,
    resolver: Arc<dyn Resolver>,
    pending: Mutex<VecDeque<Invocation<D>>>,
    current: Mutex<Option<Arc<dyn System<Data = D>>>>,
    paused: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl<D: Send + Sync + 'static> ExecutionQueue<D> {
    /// Create an empty, idle queue.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        storage: Arc<EntityStorage>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            id: QueueId::new(),
            name: name.into(),
            storage,
            resolver,
            pending: Mutex::new(VecDeque::new()),
            current: Mutex::new(None),
            paused,
            cancel: CancellationToken::new(),
        }
    }

    /// Returns the queue's unique id.
    #[must_use]
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Returns the queue's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flatten `groups` into the pending list. Each group is resolved
    /// through `cache` and asked for its systems with `data`; its
    /// invocations are appended after those of the previous group.
    pub fn setup(&self, groups: &[GroupRef<D>], data: &Arc<D>, cache: &SingletonCache) {
        let mut added = 0;
        for group_ref in groups {
            let group = group_ref.resolve(cache);
            let group_id = group.id();
            let items: Vec<Invocation<D>> = group
                .sorted(data, cache)
                .into_iter()
                .flat_map(|scheduled| Invocation::expand(scheduled, &group_id, self.id, data))
                .collect();
            debug!(
                queue = %self.id,
                group = %group_id,
                invocations = items.len(),
                "group flattened"
            );
            added += items.len();
            lock(&self.pending).extend(items);
        }
        info!(
            queue = %self.id,
            name = self.name,
            groups = groups.len(),
            invocations = added,
            "queue set up"
        );
    }

    /// Drain the queue in order.
    ///
    /// With `async_allowed = false`, a system that returns a pending result
    /// fails the run instead of being awaited.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::AsyncProhibited`] for a forbidden pending
    /// result, [`ExecutionError::MissingDependency`] for an unresolvable
    /// dependency, and [`ExecutionError::SystemFailed`] when a system's run
    /// returns an error. Processing stops at the failing item. Stopping the
    /// queue is never an error.
    pub async fn execute(&self, async_allowed: bool) -> Result<QueueOutcome, ExecutionError> {
        info!(queue = %self.id, name = self.name, async_allowed, "queue started");
        let result = self.drain(async_allowed).await;
        *lock(&self.current) = None;
        match result {
            Ok(()) => {
                info!(queue = %self.id, name = self.name, "queue completed");
                Ok(QueueOutcome::Completed)
            }
            Err(Interrupt::Stopped) => {
                lock(&self.pending).clear();
                info!(queue = %self.id, name = self.name, "queue stopped");
                Ok(QueueOutcome::Stopped)
            }
            Err(Interrupt::Failed(err)) => {
                warn!(queue = %self.id, name = self.name, error = %err, "queue failed");
                Err(err)
            }
        }
    }

    async fn drain(&self, async_allowed: bool) -> Result<(), Interrupt> {
        loop {
            self.wait_while_paused().await?;
            let next = {
                // `stop` cancels under this lock, so no item is dequeued
                // after a stop has cleared the list.
                let mut pending = lock(&self.pending);
                if self.cancel.is_cancelled() {
                    return Err(Interrupt::Stopped);
                }
                pending.pop_front()
            };
            let Some(item) = next else {
                return Ok(());
            };
            if !(item.can_execute)() {
                debug!(
                    queue = %self.id,
                    group = %item.group_id,
                    system = item.system_name(),
                    "system skipped"
                );
                continue;
            }
            let result = self.dispatch(&item, async_allowed).await;
            *lock(&self.current) = None;
            result?;
        }
    }

    async fn dispatch(&self, item: &Invocation<D>, async_allowed: bool) -> Result<(), Interrupt> {
        let system = &item.system;
        let scope = InjectionScope {
            group: item.group_id.clone(),
            queue: self.id,
        };
        let services = bind(self.resolver.as_ref(), &system.dependencies(), &scope).map_err(
            |token| ExecutionError::MissingDependency {
                system: system.name().to_string(),
                service: token.name().to_string(),
            },
        )?;
        let ctx = SystemContext::new(
            item.group_id.clone(),
            self.id,
            Arc::clone(&self.storage),
            Arc::clone(&item.data),
            system.filter().merged(&item.filter),
            item.with_disabled,
        )
        .with_services(services)
        .with_cancellation(self.cancel.clone());

        *lock(&self.current) = Some(Arc::clone(system));
        debug!(
            queue = %self.id,
            group = %item.group_id,
            system = system.name(),
            order = item.order,
            "system dispatched"
        );

        let outcome = match system.run(ctx) {
            Execution::Complete(outcome) => outcome,
            Execution::Pending(_) if !async_allowed => {
                return Err(ExecutionError::AsyncProhibited {
                    system: system.name().to_string(),
                    queue: self.id,
                }
                .into());
            }
            Execution::Pending(future) => {
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => return Err(Interrupt::Stopped),
                    outcome = future => outcome,
                }
            }
        };
        outcome.map_err(|source| {
            ExecutionError::SystemFailed {
                system: system.name().to_string(),
                queue: self.id,
                source,
            }
            .into()
        })
    }

    async fn wait_while_paused(&self) -> Result<(), Interrupt> {
        if !*self.paused.borrow() {
            return Ok(());
        }
        debug!(queue = %self.id, "waiting for resume");
        let mut rx = self.paused.subscribe();
        let resumed = async move {
            let _ = rx.wait_for(|paused| !*paused).await;
        };
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Interrupt::Stopped),
            () = resumed => Ok(()),
        }
    }

    /// Suspend the queue at the next item boundary. Idempotent.
    pub fn pause(&self) {
        if !self.paused.send_replace(true) {
            info!(queue = %self.id, name = self.name, "queue paused");
        }
    }

    /// Let a paused queue continue.
    pub fn resume(&self) {
        if self.paused.send_replace(false) {
            info!(queue = %self.id, name = self.name, "queue resumed");
        }
    }

    /// Drop pending items, signal the running system and abort any
    /// in-flight wait.
    pub fn stop(&self) {
        let dropped = {
            let mut pending = lock(&self.pending);
            self.cancel.cancel();
            let dropped = pending.len();
            pending.clear();
            dropped
        };
        let running = lock(&self.current).clone();
        if let Some(system) = running {
            system.force_stop();
        }
        info!(queue = %self.id, name = self.name, dropped, "queue stop requested");
    }

    /// Returns `true` while the queue is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of items not yet dequeued.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Copies of the items not yet dequeued, in execution order.
    #[must_use]
    pub fn pending(&self) -> Vec<Invocation<D>> {
        lock(&self.pending).iter().cloned().collect()
    }

    /// Name of the system currently running, if any.
    #[must_use]
    pub fn current_system(&self) -> Option<String> {
        lock(&self.current).as_ref().map(|s| s.name().to_string())
    }

    /// Snapshot of the queue's id, name, pause flag and pending count.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            id: self.id,
            name: self.name.clone(),
            is_paused: self.is_paused(),
            pending: self.pending_len(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
