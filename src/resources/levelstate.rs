//! Per-level ECS resources.
//!
//! These live inside a [`LevelController`](crate::level::LevelController)'s
//! world. Systems write them during a tick and the controller reads them
//! afterwards to decide which events to publish.

use bevy_ecs::prelude::Resource;
use glam::Vec2;

use crate::resources::gameconfig::GameConfig;

/// Distances and delays that govern level interactions.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct LevelRules {
    /// Enemies closer than this raise the proximity alert.
    pub alert_distance: f32,
    pub key_radius: f32,
    pub door_distance: f32,
    /// Seconds after level start before keys can be picked up.
    pub key_arm_delay: f32,
}

impl LevelRules {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            alert_distance: config.enemies.alert_distance,
            key_radius: config.level.key_radius,
            door_distance: config.level.door_distance,
            key_arm_delay: config.level.key_arm_delay_ms / 1000.0,
        }
    }
}

/// Axis-aligned world bounds every moving body is kept inside.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct LevelBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl LevelBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width, height),
        }
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min, self.max)
    }
}

/// Enemies inside alert distance on the latest tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct ProximityReport {
    pub near_count: usize,
    pub nearest: Option<f32>,
}

/// Key progress for the level.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyRing {
    pub held: u32,
    pub required: u32,
    /// Pickups that happened on the latest tick, drained by the controller.
    pub collected_this_tick: u32,
}

impl KeyRing {
    pub fn new(required: u32) -> Self {
        Self {
            required,
            ..Default::default()
        }
    }

    pub fn has_required(&self) -> bool {
        self.held >= self.required
    }
}

/// Door contact on the latest tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoorReport {
    /// Player is within trigger distance of some door.
    pub in_contact: bool,
    /// Contact started this tick without the required keys.
    pub locked_contact_started: bool,
    /// Contact with the required keys; the level should transition.
    pub unlocked: bool,
}
