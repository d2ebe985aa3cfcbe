//! Enemy proximity check.
//!
//! Counts enemies closer to their target than the alert distance, using the
//! distance each enemy measured in its behaviour step. The result goes into
//! [`ProximityReport`]; the level controller turns a non-zero count into a
//! single `EnemyNear` event.
use bevy_ecs::prelude::*;

use crate::components::enemy::Enemy;
use crate::resources::levelstate::{LevelRules, ProximityReport};

pub fn proximity_system(
    enemies: Query<&Enemy>,
    rules: Res<LevelRules>,
    mut report: ResMut<ProximityReport>,
) {
    let mut near_count = 0;
    let mut nearest: Option<f32> = None;
    for enemy in enemies.iter().filter(|e| !e.is_destroyed()) {
        let distance = enemy.distance_to_target();
        if distance < rules.alert_distance {
            near_count += 1;
        }
        if distance.is_finite() {
            nearest = Some(nearest.map_or(distance, |n| n.min(distance)));
        }
    }
    *report = ProximityReport {
        near_count,
        nearest,
    };
}
