//! Process-lifetime singleton cache for systems and groups.
//!
//! Systems and groups are stateless per run, so one instance per type is
//! shared by every queue. Instances are built on first request and never
//! evicted.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

type Instance = Arc<dyn Any + Send + Sync>;

/// Lazily-populated map from a type to its single shared instance.
#[derive(Debug, Default)]
pub struct SingletonCache {
    instances: DashMap<TypeId, Instance>,
}

impl SingletonCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached `T`, constructing it with `T::default()` on first use.
    pub fn get<T: Default + Send + Sync + 'static>(&self) -> Arc<T> {
        self.get_or_insert_with(T::default)
    }

    /// Returns the cached `T`, constructing it with `init` on first use.
    /// `init` runs under the cache's shard lock and must not touch the cache.
    pub fn get_or_insert_with<T, F>(&self, init: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let instance = Arc::clone(
            self.instances
                .entry(TypeId::of::<T>())
                .or_insert_with(|| {
                    debug!(instance = std::any::type_name::<T>(), "singleton constructed");
                    Arc::new(init()) as Instance
                })
                .value(),
        );
        instance
            .downcast::<T>()
            .unwrap_or_else(|_| unreachable!("singleton cache entries are keyed by TypeId"))
    }

    /// Returns `true` if an instance of `T` has been constructed.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.instances.contains_key(&TypeId::of::<T>())
    }

    /// Number of cached singletons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
