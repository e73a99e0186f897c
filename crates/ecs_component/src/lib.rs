//! # ecs_component
//!
//! The "E" and "C" in ECS: entities, their components, and the structural
//! filtering engine.
//!
//! This crate provides:
//!
//! - [`Component`] trait and [`ComponentType`]: data fragments and their
//!   stable runtime identity.
//! - [`ComponentCollection`]: per-entity bag, one instance per type.
//! - [`RarityTracker`]: per-type count of entities holding it enabled.
//! - [`Entity`] / [`EntityRef`]: identity, activity flag, enabled and
//!   disabled components, plus the shared handle.
//! - [`EntityStorage`]: the id registry with rarity-ordered filtering.
//! - [`Filtered`]: a filter result with sync, sequential and parallel traversal.

pub mod collection;
pub mod component;
pub mod entity;
pub mod error;
pub mod filter;
pub mod filtered;
pub mod rarity;
pub mod storage;

pub use collection::ComponentCollection;
pub use component::{Component, ComponentType, ComponentTypeId};
pub use entity::{Entity, EntityId, EntityRef};
pub use error::EntityError;
pub use filter::ComponentFilter;
pub use filtered::Filtered;
pub use rarity::RarityTracker;
pub use storage::EntityStorage;
