//! Demo world population.

use ecs_component::{EntityError, EntityStorage};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::components::{Frozen, Position, Velocity};

/// Every this many entities, one starts frozen.
const FROZEN_EVERY: usize = 5;

/// Spawn `count` moving entities spread over a grid inside `bounds`.
///
/// Positions and velocities are derived from the entity index so runs are
/// reproducible. Every [`FROZEN_EVERY`]th entity also carries [`Frozen`].
///
/// # Errors
///
/// Returns an error if an entity cannot be assembled or registered.
pub fn populate(storage: &EntityStorage, count: usize, bounds: f32) -> Result<(), EntityError> {
    let side = (count as f32).cbrt().ceil().max(1.0) as usize;
    let spacing = 2.0 * bounds / side as f32;
    for index in 0..count {
        let cell = Vec3::new(
            (index % side) as f32,
            ((index / side) % side) as f32,
            (index / (side * side)) as f32,
        );
        let position = Vec3::splat(-bounds) + (cell + 0.5) * spacing;
        let phase = index as f32 * 0.618;
        let velocity = Vec3::new(phase.cos(), phase.sin(), (phase * 0.5).sin()) * 2.0;

        let mut entity = storage
            .create_entity(format!("entity-{index}"))
            .with_name(format!("mover {index}"))
            .with_component(Position(position))?
            .with_component(Velocity(velocity))?;
        if index % FROZEN_EVERY == 0 {
            entity = entity.with_component(Frozen)?;
        }
        storage.add_entity(entity)?;
    }
    info!(entities = count, bounds, "world populated");
    Ok(())
}

/// Serializable state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: String,
    pub name: String,
    pub position: Option<Position>,
    pub velocity: Option<Velocity>,
    /// `true` while the `Frozen` marker is enabled.
    pub frozen: bool,
}

/// Capture every registered entity, in registration order.
#[must_use]
pub fn snapshot(storage: &EntityStorage) -> Vec<EntitySnapshot> {
    storage
        .all_entities()
        .iter()
        .map(|entity| {
            let entity = entity.read();
            EntitySnapshot {
                id: entity.id().to_string(),
                name: entity.name().to_string(),
                position: entity.get_component::<Position>().ok().copied(),
                velocity: entity.get_component::<Velocity>().ok().copied(),
                frozen: entity.has_component::<Frozen>(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ecs_component::Component;

    use super::*;

    #[test]
    fn test_populate_spawns_inside_bounds() {
        let storage = EntityStorage::default();
        populate(&storage, 27, 10.0).unwrap();
        assert_eq!(storage.len(), 27);
        for entity in storage.all_entities() {
            let position = entity.read().get_component::<Position>().unwrap().0;
            assert!(position.abs().max_element() <= 10.0);
        }
    }

    #[test]
    fn test_populate_freezes_every_fifth() {
        let storage = EntityStorage::default();
        populate(&storage, 10, 5.0).unwrap();
        assert_eq!(storage.rarity().rarity(Frozen::component_type_id()), 2);
        assert_eq!(storage.rarity().rarity(Position::component_type_id()), 10);
    }

    #[test]
    fn test_populate_twice_is_duplicate() {
        let storage = EntityStorage::default();
        populate(&storage, 3, 5.0).unwrap();
        let err = populate(&storage, 3, 5.0).unwrap_err();
        assert!(matches!(err, EntityError::DuplicateEntity(_)));
    }

    #[test]
    fn test_snapshot_serializes_world() {
        let storage = EntityStorage::default();
        populate(&storage, 2, 5.0).unwrap();
        let snapshot = snapshot(&storage);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "entity-0");
        assert_eq!(snapshot[0].name, "mover 0");
        assert!(snapshot[0].frozen);
        assert!(!snapshot[1].frozen);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"position\":["));
        let parsed: Vec<EntitySnapshot> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
