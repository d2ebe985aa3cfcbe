//! Kinematic body component.
//!
//! The [`RigidBody`] component stores the velocity a behaviour system wants an
//! entity to move with this tick. The movement system integrates it into
//! [`MapPosition`](super::mapposition::MapPosition).
//!
//! The `frozen` flag disables integration, e.g. while a level is tearing down
//! and positions must no longer change.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Velocity intent with an optional speed limit.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct RigidBody {
    /// Units per second.
    pub velocity: Vec2,
    pub max_speed: Option<f32>,
    /// Skipped by the movement system.
    pub frozen: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    pub fn new() -> Self {
        Self {
            velocity: Vec2::ZERO,
            max_speed: None,
            frozen: false,
        }
    }

    /// Create a RigidBody whose speed never exceeds `max_speed`.
    pub fn with_max_speed(max_speed: f32) -> Self {
        Self {
            max_speed: Some(max_speed),
            ..Self::new()
        }
    }

    /// Velocity after applying the speed limit.
    pub fn effective_velocity(&self) -> Vec2 {
        match self.max_speed {
            Some(limit) => self.velocity.clamp_length_max(limit.max(0.0)),
            None => self.velocity,
        }
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    /// Stop integrating this body; its position stays where it is.
    pub fn freeze(&mut self) {
        self.frozen = true;
        self.velocity = Vec2::ZERO;
    }
}
