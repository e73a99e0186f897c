//! Structural entity queries.
//!
//! A [`ComponentFilter`] is a pair of include/exclude type lists. An entity
//! qualifies when it holds all includes enabled and does not hold the
//! excludes enabled. Disabled components never count either way.

use crate::component::{Component, ComponentType};

/// Include/exclude component-type lists defining an entity query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFilter {
    /// Types that must all be enabled on the entity.
    pub includes: Vec<ComponentType>,
    /// Types that must not be enabled on the entity.
    pub excludes: Vec<ComponentType>,
}

impl ComponentFilter {
    /// Create an empty filter that matches every entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from explicit lists.
    #[must_use]
    pub fn from_parts(includes: Vec<ComponentType>, excludes: Vec<ComponentType>) -> Self {
        Self { includes, excludes }
    }

    /// Require component `T`.
    #[must_use]
    pub fn with<T: Component>(self) -> Self {
        self.include(T::component_type())
    }

    /// Reject entities holding component `T`.
    #[must_use]
    pub fn without<T: Component>(self) -> Self {
        self.exclude(T::component_type())
    }

    /// Require a component type given at runtime.
    #[must_use]
    pub fn include(mut self, ty: ComponentType) -> Self {
        self.includes.push(ty);
        self
    }

    /// Reject a component type given at runtime.
    #[must_use]
    pub fn exclude(mut self, ty: ComponentType) -> Self {
        self.excludes.push(ty);
        self
    }

    /// Returns `true` if neither list has entries, so every entity qualifies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Combine two filters by concatenating their lists. Types already
    /// present are not repeated.
    #[must_use]
    pub fn merged(&self, other: &ComponentFilter) -> Self {
        let mut merged = self.clone();
        for ty in &other.includes {
            if !merged.includes.contains(ty) {
                merged.includes.push(*ty);
            }
        }
        for ty in &other.excludes {
            if !merged.excludes.contains(ty) {
                merged.excludes.push(*ty);
            }
        }
        merged
    }
}
