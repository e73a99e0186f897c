//! Entity and component error types.
//!
//! Every operation that can fail checks its preconditions before touching
//! any state, so an `Err` always leaves the entity, its collections and the
//! rarity table exactly as they were.

use crate::entity::EntityId;

/// Errors raised by entity, collection and storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// An entity with this id is already registered in the storage.
    #[error("entity '{0}' is already registered")]
    DuplicateEntity(EntityId),

    /// The component type is already attached (enabled or disabled).
    #[error("component '{component}' is already attached to entity '{entity}'")]
    DuplicateComponent {
        entity: EntityId,
        component: &'static str,
    },

    /// The component type is not attached in the expected collection.
    #[error("component '{component}' not found on entity '{entity}'")]
    ComponentNotFound {
        entity: EntityId,
        component: &'static str,
    },

    /// An enable/disable call found the component outside the source collection.
    #[error("component '{component}' on entity '{entity}' is not {expected}")]
    ComponentState {
        entity: EntityId,
        component: &'static str,
        /// The state the component had to be in: `"enabled"` or `"disabled"`.
        expected: &'static str,
    },
}
