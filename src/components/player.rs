//! Player-controlled movement components.
//!
//! - [`Player`] – marks the pursuit target and carries its walking speed
//! - [`PlayerIntent`] – the direction the input collaborator wants to move in
//!
//! [`crate::systems::player::player_control_system`] turns the intent into a
//! velocity on the player's [`RigidBody`](super::rigidbody::RigidBody).

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// The entity enemies pursue and keys and doors react to.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Player {
    /// Walking speed in units per second.
    pub speed: f32,
}

impl Player {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }
}

/// Movement direction requested by input.
///
/// The direction does not need to be normalized: diagonal input of
/// `(1, 1)` moves at the same speed as `(1, 0)`.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerIntent {
    pub direction: Vec2,
}
