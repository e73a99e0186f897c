//! Per-entity component bag keyed by component type.

use std::collections::HashMap;

use crate::component::{Component, ComponentType, ComponentTypeId, StoredComponent};

/// An unordered bag of components, holding at most one instance per
/// component type.
#[derive(Debug, Default)]
pub struct ComponentCollection {
    items: HashMap<ComponentTypeId, StoredComponent>,
}

impl ComponentCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of components in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the collection holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` if a component of type `id` is present.
    #[must_use]
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        self.items.contains_key(&id)
    }

    /// Returns `true` if every listed type is present. An empty list is
    /// trivially contained.
    #[must_use]
    pub fn contains_all(&self, types: &[ComponentType]) -> bool {
        types.iter().all(|ty| self.items.contains_key(&ty.id))
    }

    /// Returns `true` if at least one listed type is present.
    #[must_use]
    pub fn contains_any(&self, types: &[ComponentType]) -> bool {
        types.iter().any(|ty| self.items.contains_key(&ty.id))
    }

    /// Returns a reference to the component of type `T`, if present.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.items
            .get(&T::component_type_id())
            .and_then(|stored| stored.value.downcast_ref::<T>())
    }

    /// Returns a mutable reference to the component of type `T`, if present.
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.items
            .get_mut(&T::component_type_id())
            .and_then(|stored| stored.value.downcast_mut::<T>())
    }

    /// Iterate over the component types held by this collection.
    pub fn types(&self) -> impl Iterator<Item = ComponentType> + '_ {
        self.items.values().map(|stored| stored.ty)
    }

    /// Insert a component. The caller guarantees the type is not present.
    pub(crate) fn insert(&mut self, stored: StoredComponent) {
        debug_assert!(!self.items.contains_key(&stored.ty.id));
        self.items.insert(stored.ty.id, stored);
    }

    pub(crate) fn remove(&mut self, id: ComponentTypeId) -> Option<StoredComponent> {
        self.items.remove(&id)
    }

    /// Move every component out, leaving the collection empty.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = StoredComponent> + '_ {
        self.items.drain().map(|(_, stored)| stored)
    }
}
