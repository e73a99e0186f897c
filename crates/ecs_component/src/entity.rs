//! Entities and the shared handle the storage hands out.
//!
//! An [`Entity`] is an identity plus a name, an active flag and two
//! [`ComponentCollection`]s: one for enabled components and one for disabled
//! ones. A component type lives in at most one of the two at any time.
//!
//! Every change to the enabled set is mirrored into the entity's
//! [`RarityTracker`].

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::collection::ComponentCollection;
use crate::component::{Component, ComponentType, StoredComponent};
use crate::error::EntityError;
use crate::filter::ComponentFilter;
use crate::rarity::RarityTracker;

/// An immutable entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(Arc<str>);

impl EntityId {
    /// Create an id from any string.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Generate a fresh random (v4 UUID) id.
    #[must_use]
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// An entity: identity, name, activity flag and its components.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    name: String,
    active: bool,
    enabled: ComponentCollection,
    disabled: ComponentCollection,
    rarity: Arc<RarityTracker>,
}

impl Entity {
    /// Create an active entity with no components. The name defaults to the id.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, rarity: Arc<RarityTracker>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            active: true,
            enabled: ComponentCollection::new(),
            disabled: ComponentCollection::new(),
            rarity,
        }
    }

    /// Set the entity's name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attach a component, builder style. See [`Entity::add_component`].
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::DuplicateComponent`] if `T` is already attached.
    pub fn with_component<T: Component>(mut self, component: T) -> Result<Self, EntityError> {
        self.add_component(component)?;
        Ok(self)
    }

    /// Returns the entity id.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Returns the display name (the id unless renamed).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the entity.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Inactive entities are skipped by filters unless the caller asks for them.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mark the entity active or inactive.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// The enabled component collection.
    #[must_use]
    pub fn enabled(&self) -> &ComponentCollection {
        &self.enabled
    }

    /// The disabled component collection.
    #[must_use]
    pub fn disabled(&self) -> &ComponentCollection {
        &self.disabled
    }

    // -- Component operations --

    /// Attach an enabled component.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::DuplicateComponent`] if `T` is already attached,
    /// enabled or disabled.
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<(), EntityError> {
        self.insert_component(component, true)
    }

    /// Attach a component into the enabled or the disabled collection.
    ///
    /// Adding a disabled component decrements the rarity of its type: a
    /// disabled component never counts toward rarity.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::DuplicateComponent`] if `T` is already attached,
    /// enabled or disabled.
    pub fn insert_component<T: Component>(
        &mut self,
        component: T,
        enabled: bool,
    ) -> Result<(), EntityError> {
        let ty = T::component_type();
        if self.enabled.contains(ty.id) || self.disabled.contains(ty.id) {
            return Err(EntityError::DuplicateComponent {
                entity: self.id.clone(),
                component: ty.name,
            });
        }

        let stored = StoredComponent::new(component);
        if enabled {
            self.enabled.insert(stored);
            self.rarity.increment(ty.id);
        } else {
            self.disabled.insert(stored);
            self.rarity.decrement(ty.id);
        }
        Ok(())
    }

    /// Returns the enabled component of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ComponentNotFound`] if `T` is absent from the
    /// enabled collection (disabled components are never returned).
    pub fn get_component<T: Component>(&self) -> Result<&T, EntityError> {
        let id = &self.id;
        self.enabled
            .get::<T>()
            .ok_or_else(|| not_found(id, T::type_name()))
    }

    /// Returns the enabled component of type `T`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ComponentNotFound`] if `T` is absent from the
    /// enabled collection.
    pub fn get_component_mut<T: Component>(&mut self) -> Result<&mut T, EntityError> {
        let id = &self.id;
        self.enabled
            .get_mut::<T>()
            .ok_or_else(|| not_found(id, T::type_name()))
    }

    /// Returns `true` if `T` is attached and enabled.
    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.enabled.contains(T::component_type_id())
    }

    /// Returns `true` if every listed type is attached and enabled.
    #[must_use]
    pub fn has_components(&self, types: &[ComponentType]) -> bool {
        self.enabled.contains_all(types)
    }

    /// Returns `Some(true)` for an enabled component, `Some(false)` for a
    /// disabled one and `None` when the type is not attached.
    #[must_use]
    pub fn is_component_enabled(&self, ty: ComponentType) -> Option<bool> {
        if self.enabled.contains(ty.id) {
            Some(true)
        } else if self.disabled.contains(ty.id) {
            Some(false)
        } else {
            None
        }
    }

    /// Detach component `T` from whichever collection holds it and return it.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ComponentNotFound`] if `T` is not attached.
    pub fn remove_component<T: Component>(&mut self) -> Result<T, EntityError> {
        let ty = T::component_type();
        let holds_t = |collection: &ComponentCollection| collection.get::<T>().is_some();
        if !holds_t(&self.enabled) && !holds_t(&self.disabled) {
            return Err(not_found(&self.id, ty.name));
        }

        let stored = self.detach(ty)?;
        stored
            .value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| not_found(&self.id, ty.name))
    }

    /// Detach the component of type `ty` from whichever collection holds it.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ComponentNotFound`] if the type is not attached.
    pub fn remove_component_by_type(&mut self, ty: ComponentType) -> Result<(), EntityError> {
        self.detach(ty).map(drop)
    }

    fn detach(&mut self, ty: ComponentType) -> Result<StoredComponent, EntityError> {
        let stored = self
            .enabled
            .remove(ty.id)
            .or_else(|| self.disabled.remove(ty.id))
            .ok_or_else(|| not_found(&self.id, ty.name))?;
        self.rarity.decrement(ty.id);
        Ok(stored)
    }

    /// Move component `T` from the disabled to the enabled collection.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ComponentState`] if `T` is not disabled.
    pub fn enable_component<T: Component>(&mut self) -> Result<(), EntityError> {
        self.enable_component_by_type(T::component_type())
    }

    /// Type-erased form of [`Entity::enable_component`].
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ComponentState`] if the type is not disabled.
    pub fn enable_component_by_type(&mut self, ty: ComponentType) -> Result<(), EntityError> {
        let stored = self
            .disabled
            .remove(ty.id)
            .ok_or_else(|| state_error(&self.id, ty.name, "disabled"))?;
        self.enabled.insert(stored);
        self.rarity.increment(ty.id);
        Ok(())
    }

    /// Move component `T` from the enabled to the disabled collection.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ComponentState`] if `T` is not enabled.
    pub fn disable_component<T: Component>(&mut self) -> Result<(), EntityError> {
        self.disable_component_by_type(T::component_type())
    }

    /// Type-erased form of [`Entity::disable_component`].
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::ComponentState`] if the type is not enabled.
    pub fn disable_component_by_type(&mut self, ty: ComponentType) -> Result<(), EntityError> {
        let stored = self
            .enabled
            .remove(ty.id)
            .ok_or_else(|| state_error(&self.id, ty.name, "enabled"))?;
        self.disabled.insert(stored);
        self.rarity.decrement(ty.id);
        Ok(())
    }

    /// Move every disabled component into the enabled collection.
    pub fn enable_all_components(&mut self) {
        for stored in self.disabled.drain() {
            self.rarity.increment(stored.ty.id);
            self.enabled.insert(stored);
        }
    }

    /// Move every enabled component into the disabled collection.
    pub fn disable_all_components(&mut self) {
        for stored in self.enabled.drain() {
            self.rarity.decrement(stored.ty.id);
            self.disabled.insert(stored);
        }
    }

    /// Returns `true` if the entity holds every include enabled and none of
    /// the excludes enabled.
    #[must_use]
    pub fn is_satisfied_filter(&self, filter: &ComponentFilter) -> bool {
        self.matches(&filter.includes, &filter.excludes)
    }

    /// Predicate used by filtering; `includes` and `excludes` are checked in
    /// the order given so callers can put the most selective type first.
    pub(crate) fn matches(&self, includes: &[ComponentType], excludes: &[ComponentType]) -> bool {
        self.enabled.contains_all(includes)
            && (excludes.is_empty() || !self.enabled.contains_all(excludes))
    }
}

fn not_found(entity: &EntityId, component: &'static str) -> EntityError {
    EntityError::ComponentNotFound {
        entity: entity.clone(),
        component,
    }
}

fn state_error(entity: &EntityId, component: &'static str, expected: &'static str) -> EntityError {
    EntityError::ComponentState {
        entity: entity.clone(),
        component,
        expected,
    }
}

/// A shared, lockable handle to an [`Entity`].
///
/// The storage, filtered results and running systems all hold clones of the
/// same handle. Critical sections never panic, so a poisoned lock is
/// recovered rather than propagated.
#[derive(Debug, Clone)]
pub struct EntityRef {
    id: EntityId,
    cell: Arc<RwLock<Entity>>,
}

impl EntityRef {
    /// Wrap an entity into a shared handle.
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self {
            id: entity.id.clone(),
            cell: Arc::new(RwLock::new(entity)),
        }
    }

    /// The entity id, readable without locking.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Lock the entity for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Entity> {
        self.cell.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the entity for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Entity> {
        self.cell.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles point at the same entity.
    #[must_use]
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position(f32, f32);

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity;

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    mod other {
        use super::Component;

        #[derive(Debug, Clone, PartialEq)]
        pub struct Position(pub u8);

        impl Component for Position {
            fn type_name() -> &'static str {
                "Position"
            }
        }
    }

    fn entity(id: &str) -> (Entity, Arc<RarityTracker>) {
        let rarity = Arc::new(RarityTracker::new());
        (Entity::new(id, Arc::clone(&rarity)), rarity)
    }

    #[test]
    fn test_entity_defaults() {
        let (e, _) = entity("e1");
        assert_eq!(e.id().as_str(), "e1");
        assert_eq!(e.name(), "e1");
        assert!(e.is_active());
        assert!(e.enabled().is_empty());
        assert!(e.disabled().is_empty());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn test_add_and_get_component() {
        let (mut e, rarity) = entity("e1");
        e.add_component(Position(1.0, 2.0)).unwrap();
        assert_eq!(e.get_component::<Position>().unwrap(), &Position(1.0, 2.0));
        assert!(e.has_component::<Position>());
        assert_eq!(rarity.rarity(Position::component_type_id()), 1);
    }

    #[test]
    fn test_add_duplicate_component_fails_in_either_state() {
        let (mut e, rarity) = entity("e1");
        e.add_component(Position(0.0, 0.0)).unwrap();
        let err = e.add_component(Position(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, EntityError::DuplicateComponent { component: "Position", .. }));

        e.insert_component(Health(3), false).unwrap();
        let err = e.add_component(Health(4)).unwrap_err();
        assert!(matches!(err, EntityError::DuplicateComponent { component: "Health", .. }));

        // Failed adds leave state untouched.
        assert_eq!(e.get_component::<Position>().unwrap(), &Position(0.0, 0.0));
        assert_eq!(rarity.rarity(Position::component_type_id()), 1);
    }

    #[test]
    fn test_same_named_types_are_separate_components() {
        let (mut e, rarity) = entity("e1");
        e.add_component(Position(1.0, 2.0)).unwrap();
        assert!(!e.has_component::<other::Position>());
        e.add_component(other::Position(7)).unwrap();

        assert_eq!(e.get_component::<Position>().unwrap(), &Position(1.0, 2.0));
        assert_eq!(
            e.get_component::<other::Position>().unwrap(),
            &other::Position(7)
        );
        assert_eq!(rarity.rarity(Position::component_type_id()), 1);
        assert_eq!(rarity.rarity(other::Position::component_type_id()), 1);

        e.remove_component_by_type(other::Position::component_type())
            .unwrap();
        assert!(e.has_component::<Position>());
        assert!(!e.has_component::<other::Position>());
        assert_eq!(rarity.rarity(Position::component_type_id()), 1);
    }

    #[test]
    fn test_get_disabled_component_fails() {
        let (mut e, _) = entity("e1");
        e.insert_component(Health(10), false).unwrap();
        assert!(matches!(
            e.get_component::<Health>(),
            Err(EntityError::ComponentNotFound { .. })
        ));
        assert_eq!(e.is_component_enabled(Health::component_type()), Some(false));
        assert_eq!(e.is_component_enabled(Position::component_type()), None);
    }

    #[test]
    fn test_remove_component_from_either_collection() {
        let (mut e, rarity) = entity("e1");
        e.add_component(Position(3.0, 4.0)).unwrap();
        e.insert_component(Health(1), false).unwrap();

        assert_eq!(e.remove_component::<Position>().unwrap(), Position(3.0, 4.0));
        assert_eq!(rarity.rarity(Position::component_type_id()), 0);
        e.remove_component_by_type(Health::component_type()).unwrap();
        assert!(e.enabled().is_empty());
        assert!(e.disabled().is_empty());

        assert!(matches!(
            e.remove_component::<Velocity>(),
            Err(EntityError::ComponentNotFound { component: "Velocity", .. })
        ));
    }

    #[test]
    fn test_enable_and_disable_component() {
        let (mut e, rarity) = entity("e1");
        e.add_component(Position(0.0, 0.0)).unwrap();

        e.disable_component::<Position>().unwrap();
        assert!(!e.has_component::<Position>());
        assert!(e.disabled().contains(Position::component_type_id()));
        assert_eq!(rarity.rarity(Position::component_type_id()), 0);

        let err = e.disable_component::<Position>().unwrap_err();
        assert!(matches!(err, EntityError::ComponentState { expected: "enabled", .. }));

        e.enable_component::<Position>().unwrap();
        assert!(e.has_component::<Position>());
        assert!(!e.disabled().contains(Position::component_type_id()));
        assert_eq!(rarity.rarity(Position::component_type_id()), 1);

        let err = e.enable_component::<Position>().unwrap_err();
        assert!(matches!(err, EntityError::ComponentState { expected: "disabled", .. }));
    }

    #[test]
    fn test_bulk_enable_and_disable() {
        let (mut e, rarity) = entity("e1");
        e.add_component(Position(0.0, 0.0)).unwrap();
        e.add_component(Health(5)).unwrap();

        e.disable_all_components();
        assert!(e.enabled().is_empty());
        assert_eq!(e.disabled().len(), 2);
        assert!(rarity.is_empty());

        e.enable_all_components();
        assert!(e.disabled().is_empty());
        assert_eq!(e.enabled().len(), 2);
        assert_eq!(rarity.rarity(Health::component_type_id()), 1);
    }

    #[test]
    fn test_collections_stay_exclusive() {
        let (mut e, _) = entity("e1");
        e.add_component(Position(0.0, 0.0)).unwrap();
        e.disable_component::<Position>().unwrap();
        e.enable_component::<Position>().unwrap();
        e.disable_all_components();
        e.enable_all_components();
        let id = Position::component_type_id();
        assert!(e.enabled().contains(id) ^ e.disabled().contains(id));
    }

    #[test]
    fn test_is_satisfied_filter() {
        let (mut e, _) = entity("e1");
        e.add_component(Position(0.0, 0.0)).unwrap();
        e.add_component(Health(1)).unwrap();
        e.insert_component(Velocity, false).unwrap();

        let f = ComponentFilter::new().with::<Position>().with::<Health>();
        assert!(e.is_satisfied_filter(&f));

        // Disabled components never satisfy an exclude.
        let f = ComponentFilter::new().with::<Position>().without::<Velocity>();
        assert!(e.is_satisfied_filter(&f));

        let f = ComponentFilter::new().without::<Health>();
        assert!(!e.is_satisfied_filter(&f));

        let f = ComponentFilter::new().with::<Velocity>();
        assert!(!e.is_satisfied_filter(&f));

        assert!(e.is_satisfied_filter(&ComponentFilter::new()));
    }

    #[test]
    fn test_entity_ref_shares_state() {
        let (e, _) = entity("e1");
        let handle = EntityRef::new(e);
        let clone = handle.clone();
        clone.write().add_component(Health(9)).unwrap();
        assert_eq!(handle.read().get_component::<Health>().unwrap(), &Health(9));
        assert!(handle.ptr_eq(&clone));
        assert_eq!(handle.id().as_str(), "e1");
    }
}
