//! Player intent-to-velocity controller.
//!
//! Reads each [`PlayerIntent`] and sets the player's velocity. Diagonal
//! movement is normalized to keep a constant speed.
use bevy_ecs::prelude::*;

use crate::components::player::{Player, PlayerIntent};
use crate::components::rigidbody::RigidBody;

pub fn player_control_system(mut query: Query<(&Player, &PlayerIntent, &mut RigidBody)>) {
    for (player, intent, mut rigidbody) in query.iter_mut() {
        rigidbody.velocity = intent.direction.normalize_or_zero() * player.speed;
    }
}
