//! Position integration.
//!
//! Moves every [`RigidBody`] by its velocity for the current tick's delta and
//! keeps it inside the level's [`LevelBounds`] when that resource exists.
use bevy_ecs::prelude::*;

use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::resources::levelstate::LevelBounds;
use crate::resources::worldtime::WorldTime;

pub fn movement_system(
    mut query: Query<(&mut MapPosition, &RigidBody)>,
    time: Res<WorldTime>,
    bounds: Option<Res<LevelBounds>>,
) {
    for (mut position, rigidbody) in query.iter_mut() {
        if rigidbody.frozen {
            continue;
        }
        let delta = rigidbody.effective_velocity() * time.delta;
        let moved = position.pos + delta;
        position.pos = match bounds.as_deref() {
            Some(bounds) => bounds.clamp(moved),
            None => moved,
        };
    }
}
