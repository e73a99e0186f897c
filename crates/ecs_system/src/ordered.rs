//! Numeric-order scheduling, kept for groups written against explicit order
//! numbers.
//!
//! Entries without an order get `(position + 1) * ORDER_STEP`, leaving gaps so
//! an explicit order can slot a system between two defaulted ones. The list
//! is then stably sorted by order.

use crate::config::SystemConfig;

/// Gap between defaulted order numbers.
pub const ORDER_STEP: u64 = 10_000;

/// A list of system configs sorted by order number.
pub struct OrderedSystems<D> {
    entries: Vec<(Option<u64>, SystemConfig<D>)>,
}

impl<D> OrderedSystems<D> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of configs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `config` with a defaulted order.
    pub fn add(&mut self, config: SystemConfig<D>) -> &mut Self {
        self.entries.push((None, config));
        self
    }

    /// Add `config` with an explicit order.
    pub fn add_at(&mut self, order: u64, config: SystemConfig<D>) -> &mut Self {
        self.entries.push((Some(order), config));
        self
    }

    /// Resolve default orders and sort. Ties keep insertion order.
    #[must_use]
    pub fn into_sorted(self) -> Vec<(u64, SystemConfig<D>)> {
        let mut resolved: Vec<(u64, SystemConfig<D>)> = self
            .entries
            .into_iter()
            .enumerate()
            .map(|(index, (order, config))| {
                let order = order.unwrap_or((index as u64 + 1) * ORDER_STEP);
                (order, config)
            })
            .collect();
        resolved.sort_by_key(|(order, _)| *order);
        resolved
    }
}

impl<D> Default for OrderedSystems<D> {
    fn default() -> Self {
        Self::new()
    }
}
