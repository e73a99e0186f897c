//! Entity registry and rarity-ordered filtering.
//!
//! The [`EntityStorage`] owns every live [`EntityRef`] by id and answers
//! structural queries. It is shared between concurrently running queues, so
//! all methods take `&self`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace};

use crate::entity::{Entity, EntityId, EntityRef};
use crate::error::EntityError;
use crate::filter::ComponentFilter;
use crate::filtered::Filtered;
use crate::rarity::RarityTracker;

#[derive(Debug, Default)]
struct Registry {
    by_id: HashMap<EntityId, EntityRef>,
    /// Registration order, used for stable iteration.
    order: Vec<EntityId>,
}

impl Registry {
    fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

/// Registry of all entities, keyed by id.
#[derive(Debug)]
pub struct EntityStorage {
    rarity: Arc<RarityTracker>,
    registry: RwLock<Registry>,
}

impl EntityStorage {
    /// Create an empty storage that ranks filters with `rarity`.
    #[must_use]
    pub fn new(rarity: Arc<RarityTracker>) -> Self {
        Self {
            rarity,
            registry: RwLock::new(Registry::default()),
        }
    }

    /// The rarity table shared with this storage's entities.
    #[must_use]
    pub fn rarity(&self) -> &Arc<RarityTracker> {
        &self.rarity
    }

    /// Create an entity bound to this storage's rarity table. The entity is
    /// not registered until passed to [`EntityStorage::add_entity`].
    #[must_use]
    pub fn create_entity(&self, id: impl Into<EntityId>) -> Entity {
        Entity::new(id, Arc::clone(&self.rarity))
    }

    /// Create and register an entity with a generated id.
    pub fn spawn(&self, name: impl Into<String>) -> EntityRef {
        let entity = self.create_entity(EntityId::generate()).with_name(name);
        let handle = EntityRef::new(entity);
        let mut registry = self.write();
        registry.order.push(handle.id().clone());
        registry.by_id.insert(handle.id().clone(), handle.clone());
        debug!(entity = %handle.id(), "entity spawned");
        handle
    }

    /// Register an entity.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::DuplicateEntity`] if the id is already registered.
    pub fn add_entity(&self, entity: Entity) -> Result<EntityRef, EntityError> {
        let mut registry = self.write();
        if registry.by_id.contains_key(entity.id()) {
            return Err(EntityError::DuplicateEntity(entity.id().clone()));
        }
        let handle = EntityRef::new(entity);
        registry.order.push(handle.id().clone());
        registry.by_id.insert(handle.id().clone(), handle.clone());
        debug!(entity = %handle.id(), "entity added");
        Ok(handle)
    }

    /// Unregister an entity, returning it if it was present.
    pub fn remove_entity(&self, id: &EntityId) -> Option<EntityRef> {
        let mut registry = self.write();
        let removed = registry.by_id.remove(id)?;
        registry.order.retain(|other| other != id);
        debug!(entity = %id, "entity removed");
        Some(removed)
    }

    /// Look up an entity by id.
    #[must_use]
    pub fn get_entity(&self, id: &EntityId) -> Option<EntityRef> {
        self.read().by_id.get(id).cloned()
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.read().by_id.contains_key(id)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }

    /// Returns `true` if no entity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().by_id.is_empty()
    }

    /// Unregister every entity.
    pub fn clear(&self) {
        let mut registry = self.write();
        registry.by_id.clear();
        registry.order.clear();
    }

    /// Every entity, in registration order.
    #[must_use]
    pub fn all_entities(&self) -> Vec<EntityRef> {
        self.read().iter().cloned().collect()
    }

    /// Entities whose `active` flag is set, in registration order.
    #[must_use]
    pub fn active_entities(&self) -> Vec<EntityRef> {
        self.entities_where_active(true)
    }

    /// Entities whose `active` flag is cleared, in registration order.
    #[must_use]
    pub fn inactive_entities(&self) -> Vec<EntityRef> {
        self.entities_where_active(false)
    }

    fn entities_where_active(&self, active: bool) -> Vec<EntityRef> {
        self.all_entities()
            .into_iter()
            .filter(|e| e.read().is_active() == active)
            .collect()
    }

    /// Select the entities satisfying `filter`.
    ///
    /// The base population is every entity when `with_disabled` is set and
    /// only the active ones otherwise. Disabled components never satisfy the
    /// filter either way. Include and exclude lists are checked rarest type
    /// first; the result keeps registration order.
    #[must_use]
    pub fn filter(&self, filter: &ComponentFilter, with_disabled: bool) -> Filtered {
        let base = if with_disabled {
            self.all_entities()
        } else {
            self.active_entities()
        };

        if filter.is_empty() {
            return Filtered::new(base);
        }

        let mut includes = filter.includes.clone();
        let mut excludes = filter.excludes.clone();
        self.rarity.sort_rarest_first(&mut includes);
        self.rarity.sort_rarest_first(&mut excludes);

        let matched: Vec<EntityRef> = base
            .into_iter()
            .filter(|e| e.read().matches(&includes, &excludes))
            .collect();
        trace!(
            includes = includes.len(),
            excludes = excludes.len(),
            matched = matched.len(),
            "filter evaluated"
        );
        Filtered::new(matched)
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EntityStorage {
    fn default() -> Self {
        Self::new(Arc::new(RarityTracker::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    #[derive(Debug)]
    struct Position;
    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug)]
    struct Health;
    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug)]
    struct Velocity;
    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    fn ids(filtered: &Filtered) -> Vec<String> {
        filtered.ids().iter().map(ToString::to_string).collect()
    }

    fn sample_storage() -> EntityStorage {
        let storage = EntityStorage::default();
        let e1 = storage
            .create_entity("e1")
            .with_component(Position)
            .and_then(|e| e.with_component(Health))
            .unwrap();
        let e2 = storage.create_entity("e2").with_component(Position).unwrap();
        let e3 = storage.create_entity("e3").with_component(Velocity).unwrap();
        storage.add_entity(e1).unwrap();
        storage.add_entity(e2).unwrap();
        storage.add_entity(e3).unwrap();
        storage
    }

    #[test]
    fn test_sample_scenario() {
        let storage = sample_storage();
        let filter = ComponentFilter::new().with::<Position>().without::<Velocity>();
        let result = storage.filter(&filter, false);
        assert_eq!(ids(&result), vec!["e1", "e2"]);
    }

    #[test]
    fn test_add_duplicate_entity_fails() {
        let storage = EntityStorage::default();
        storage.add_entity(storage.create_entity("e1")).unwrap();
        let err = storage.add_entity(storage.create_entity("e1")).unwrap_err();
        assert_eq!(err, EntityError::DuplicateEntity(EntityId::from("e1")));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_remove_and_get_entity() {
        let storage = sample_storage();
        let id = EntityId::from("e2");
        assert!(storage.get_entity(&id).is_some());
        let removed = storage.remove_entity(&id).unwrap();
        assert_eq!(removed.id(), &id);
        assert!(storage.get_entity(&id).is_none());
        assert!(storage.remove_entity(&id).is_none());
        assert_eq!(ids(&Filtered::new(storage.all_entities())), vec!["e1", "e3"]);
    }

    #[test]
    fn test_active_and_inactive_views() {
        let storage = sample_storage();
        storage
            .get_entity(&EntityId::from("e2"))
            .unwrap()
            .write()
            .set_active(false);

        assert_eq!(ids(&Filtered::new(storage.active_entities())), vec!["e1", "e3"]);
        assert_eq!(ids(&Filtered::new(storage.inactive_entities())), vec!["e2"]);
        assert_eq!(storage.all_entities().len(), 3);
    }

    #[test]
    fn test_filter_with_disabled_includes_inactive_entities() {
        let storage = sample_storage();
        storage
            .get_entity(&EntityId::from("e1"))
            .unwrap()
            .write()
            .set_active(false);

        let filter = ComponentFilter::new().with::<Position>();
        assert_eq!(ids(&storage.filter(&filter, false)), vec!["e2"]);
        assert_eq!(ids(&storage.filter(&filter, true)), vec!["e1", "e2"]);
    }

    #[test]
    fn test_filter_ignores_disabled_components() {
        let storage = sample_storage();
        let e1 = storage.get_entity(&EntityId::from("e1")).unwrap();
        e1.write().disable_component::<Health>().unwrap();

        let with_health = ComponentFilter::new().with::<Health>();
        assert!(storage.filter(&with_health, true).is_empty());

        let without_health = ComponentFilter::new().without::<Health>();
        assert_eq!(
            ids(&storage.filter(&without_health, false)),
            vec!["e1", "e2", "e3"]
        );
    }

    #[test]
    fn test_empty_filter_returns_base_population() {
        let storage = sample_storage();
        let result = storage.filter(&ComponentFilter::new(), false);
        assert_eq!(ids(&result), vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_exclude_list_rejects_only_full_match() {
        let storage = sample_storage();
        // Rejected only when every exclude is enabled.
        let filter = ComponentFilter::new()
            .with::<Position>()
            .without::<Position>()
            .without::<Health>();
        assert_eq!(ids(&storage.filter(&filter, false)), vec!["e2"]);
    }

    #[test]
    fn test_filter_matches_entity_predicate() {
        let storage = sample_storage();
        let filters = [
            ComponentFilter::new().with::<Health>(),
            ComponentFilter::new().with::<Position>().with::<Health>(),
            ComponentFilter::new().without::<Position>(),
            ComponentFilter::new().with::<Velocity>().without::<Health>(),
        ];
        for filter in &filters {
            let expected: Vec<String> = storage
                .active_entities()
                .iter()
                .filter(|e| e.read().is_satisfied_filter(filter))
                .map(|e| e.id().to_string())
                .collect();
            assert_eq!(ids(&storage.filter(filter, false)), expected);
        }
    }

    #[test]
    fn test_rarity_follows_component_changes() {
        let storage = EntityStorage::default();
        let handles: Vec<EntityRef> = (0..4)
            .map(|i| {
                let e = storage
                    .create_entity(format!("e{i}"))
                    .with_component(Position)
                    .unwrap();
                storage.add_entity(e).unwrap()
            })
            .collect();
        let pos = Position::component_type_id();
        assert_eq!(storage.rarity().rarity(pos), 4);

        handles[0].write().disable_component::<Position>().unwrap();
        assert_eq!(storage.rarity().rarity(pos), 3);

        for handle in &handles[1..] {
            handle.write().remove_component::<Position>().unwrap();
        }
        assert_eq!(storage.rarity().rarity(pos), 0);
        assert!(!storage.rarity().is_tracked(pos));
    }

    #[test]
    fn test_spawn_generates_ids() {
        let storage = EntityStorage::default();
        let a = storage.spawn("alpha");
        let b = storage.spawn("beta");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.read().name(), "alpha");
        assert!(storage.contains(b.id()));
        storage.clear();
        assert!(storage.is_empty());
    }
}
