//! Level objects the player interacts with by touching them.

use bevy_ecs::prelude::Component;

/// Collectible key.
///
/// A key stays in the world after pickup with `collected` set, so it can
/// never be counted twice.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Key {
    pub collected: bool,
}

/// Exit trigger. Opens only when the player holds the required keys.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Door;
