//! Process-scoped rarity table.
//!
//! The [`RarityTracker`] counts, per component type, how many entities hold
//! that component enabled. Filters sort their include/exclude lists by this
//! count so that the rarest (most selective) type is checked first.
//!
//! The tracker is an explicit service: entities and the storage receive an
//! `Arc<RarityTracker>` at construction, so each world (and each test) owns
//! an independent table.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::component::{ComponentType, ComponentTypeId};

/// Maps each component type to the number of entities holding it enabled.
///
/// Entries are removed once their count drops to zero; an absent entry has
/// rarity `0`. Decrements saturate at zero.
#[derive(Debug, Default)]
pub struct RarityTracker {
    counts: DashMap<ComponentTypeId, usize>,
}

impl RarityTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more entity holding `ty` enabled.
    pub fn increment(&self, ty: ComponentTypeId) {
        *self.counts.entry(ty).or_insert(0) += 1;
    }

    /// Record one fewer entity holding `ty` enabled.
    pub fn decrement(&self, ty: ComponentTypeId) {
        if let Entry::Occupied(mut entry) = self.counts.entry(ty) {
            let count = entry.get_mut();
            *count = count.saturating_sub(1);
            if *count == 0 {
                entry.remove();
            }
        }
    }

    /// Returns the current count for `ty` (`0` when untracked).
    #[must_use]
    pub fn rarity(&self, ty: ComponentTypeId) -> usize {
        self.counts.get(&ty).map_or(0, |count| *count)
    }

    /// Returns `true` if at least one entity holds `ty` enabled.
    #[must_use]
    pub fn is_tracked(&self, ty: ComponentTypeId) -> bool {
        self.counts.contains_key(&ty)
    }

    /// Returns the number of distinct tracked component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if no component type is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Forget every count.
    pub fn clear(&self) {
        self.counts.clear();
    }

    /// Sort `types` ascending by rarity (rarest first). The sort is stable,
    /// so equally rare types keep their declared order.
    pub fn sort_rarest_first(&self, types: &mut [ComponentType]) {
        types.sort_by_cached_key(|ty| self.rarity(ty.id));
    }
}
