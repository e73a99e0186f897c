//! Demo components.

use ecs_component::Component;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World-space position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position(pub Vec3);

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// Linear velocity in units per second.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Velocity(pub Vec3);

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// Marker: the entity does not move while this is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frozen;

impl Component for Frozen {
    fn type_name() -> &'static str {
        "Frozen"
    }
}
