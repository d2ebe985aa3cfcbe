//! Enemy behaviour step.
//!
//! Runs [`Enemy::update_tick`] for every enemy against the latest
//! [`CurrentSoundLevel`] and its target's position, and writes the resulting
//! velocity into the enemy's [`RigidBody`]. An enemy whose target no longer
//! exists stands still.
use bevy_ecs::prelude::*;
use log::trace;

use crate::components::enemy::Enemy;
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::resources::sound::CurrentSoundLevel;

pub fn enemy_behavior_system(
    mut enemies: Query<(&mut Enemy, &MapPosition, &mut RigidBody)>,
    targets: Query<&MapPosition, Without<Enemy>>,
    sound: Res<CurrentSoundLevel>,
) {
    for (mut enemy, position, mut rigidbody) in enemies.iter_mut() {
        let Ok(target) = targets.get(enemy.target()) else {
            trace!("enemy target {:?} is gone", enemy.target());
            rigidbody.stop();
            continue;
        };
        rigidbody.velocity = enemy.update_tick(sound.0, position.pos, target.pos);
    }
}
