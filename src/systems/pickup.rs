//! Key pickup and door checks.
//!
//! - [`key_pickup_system`] – collects keys the player overlaps once they are armed
//! - [`door_check_system`] – reports door contact, locked or unlocked
use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::mapposition::MapPosition;
use crate::components::pickup::{Door, Key};
use crate::components::player::Player;
use crate::resources::levelstate::{DoorReport, KeyRing, LevelRules};
use crate::resources::worldtime::WorldTime;

/// Collect every armed key within `key_radius` of the player.
///
/// Keys are armed `key_arm_delay` seconds after the level starts so a key
/// placed on the spawn point is not picked up instantly.
pub fn key_pickup_system(
    mut keys: Query<(&mut Key, &MapPosition)>,
    players: Query<&MapPosition, With<Player>>,
    time: Res<WorldTime>,
    rules: Res<LevelRules>,
    mut ring: ResMut<KeyRing>,
) {
    ring.collected_this_tick = 0;
    if time.elapsed < rules.key_arm_delay {
        return;
    }
    let Ok(player) = players.single() else {
        return;
    };
    for (mut key, position) in keys.iter_mut() {
        if key.collected || position.distance_to(player) > rules.key_radius {
            continue;
        }
        key.collected = true;
        ring.held += 1;
        ring.collected_this_tick += 1;
        info!("Key collected ({}/{})", ring.held, ring.required);
    }
}

/// Check whether the player touches a door, and whether it opens.
///
/// `locked_contact_started` is only raised on the tick the player first
/// reaches a door without the required keys.
pub fn door_check_system(
    doors: Query<&MapPosition, With<Door>>,
    players: Query<&MapPosition, With<Player>>,
    rules: Res<LevelRules>,
    ring: Res<KeyRing>,
    mut report: ResMut<DoorReport>,
) {
    let in_contact = match players.single() {
        Ok(player) => doors
            .iter()
            .any(|door| door.distance_to(player) < rules.door_distance),
        Err(_) => false,
    };
    let was_in_contact = report.in_contact;
    let unlocked = in_contact && ring.has_required();
    let locked_contact_started = in_contact && !was_in_contact && !unlocked;
    if locked_contact_started {
        debug!("Door locked: {}/{} keys", ring.held, ring.required);
    }
    *report = DoorReport {
        in_contact,
        locked_contact_started,
        unlocked,
    };
}
