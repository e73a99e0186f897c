//! Per-entry configuration of a system inside a group.

use std::fmt;
use std::sync::Arc;

use ecs_component::{Component, ComponentFilter};

use crate::system::System;

/// Guard evaluated right before an invocation runs.
pub type Condition = Arc<dyn Fn() -> bool + Send + Sync>;

/// How one system is scheduled by its group.
///
/// Every field starts at its default (`with_disabled = false`, empty filter
/// extension, `repeat = 1`, always executable, queue data), so a config is
/// complete as soon as it is built.
pub struct SystemConfig<D> {
    /// The system to run.
    pub system: Arc<dyn System<Data = D>>,
    /// Data override; `None` runs with the queue's data.
    pub data: Option<Arc<D>>,
    /// Extra includes/excludes merged into the system's own filter.
    pub filter: ComponentFilter,
    /// Whether inactive entities are part of the filtered population.
    pub with_disabled: bool,
    /// How many consecutive invocations this entry expands to (at least 1).
    pub repeat: usize,
    /// Checked before each invocation; `false` skips it.
    pub can_execute: Condition,
    /// Builder-chain key; generated when absent.
    pub key: Option<String>,
}

impl<D: Send + Sync + 'static> SystemConfig<D> {
    /// A config with every field at its default.
    pub fn new(system: Arc<dyn System<Data = D>>) -> Self {
        Self {
            system,
            data: None,
            filter: ComponentFilter::new(),
            with_disabled: false,
            repeat: 1,
            can_execute: Arc::new(|| true),
            key: None,
        }
    }

    /// Run with `data` instead of the queue's data.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<Arc<D>>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Additionally require component `T`.
    #[must_use]
    pub fn include<T: Component>(mut self) -> Self {
        self.filter = self.filter.with::<T>();
        self
    }

    /// Additionally reject entities holding component `T`.
    #[must_use]
    pub fn exclude<T: Component>(mut self) -> Self {
        self.filter = self.filter.without::<T>();
        self
    }

    /// Replace the filter extension.
    #[must_use]
    pub fn with_filter(mut self, filter: ComponentFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Also consider inactive entities when filtering.
    #[must_use]
    pub fn with_disabled(mut self, with_disabled: bool) -> Self {
        self.with_disabled = with_disabled;
        self
    }

    /// Expand into `times` consecutive invocations. Zero is clamped to one.
    #[must_use]
    pub fn repeat(mut self, times: usize) -> Self {
        self.repeat = times.max(1);
        self
    }

    /// Only run while `condition` returns `true`.
    #[must_use]
    pub fn run_if<F>(mut self, condition: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.can_execute = Arc::new(condition);
        self
    }

    /// Set the builder-chain key used by insert-before/after, replace and remove.
    #[must_use]
    pub fn keyed(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Name of the configured system.
    #[must_use]
    pub fn system_name(&self) -> &str {
        self.system.name()
    }
}

impl<D> Clone for SystemConfig<D> {
    fn clone(&self) -> Self {
        Self {
            system: Arc::clone(&self.system),
            data: self.data.clone(),
            filter: self.filter.clone(),
            with_disabled: self.with_disabled,
            repeat: self.repeat,
            can_execute: Arc::clone(&self.can_execute),
            key: self.key.clone(),
        }
    }
}

impl<D: Send + Sync + 'static> fmt::Debug for SystemConfig<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemConfig")
            .field("system", &self.system.name())
            .field("key", &self.key)
            .field("filter", &self.filter)
            .field("with_disabled", &self.with_disabled)
            .field("repeat", &self.repeat)
            .finish_non_exhaustive()
    }
}
