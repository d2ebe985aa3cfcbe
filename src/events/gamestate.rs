//! Level flow and lifecycle events.
//!
//! These are mostly markers for presentation collaborators (menus, sound
//! effects, scene switching). [`StartGame`] is also consumed by
//! [`Game`](crate::game::Game) to (re)start a run.

use crate::events::bus::BusEvent;

/// Start, or restart, a run from the first level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartGame;

impl BusEvent for StartGame {
    const NAME: &'static str = "start-game";
}

/// The player picked up a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCollected {
    /// Keys held after this pickup.
    pub held: u32,
    /// Keys the level requires to open a door.
    pub required: u32,
}

impl BusEvent for KeyCollected {
    const NAME: &'static str = "key-collected";
}

/// The player reached a door without enough keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorLocked;

impl BusEvent for DoorLocked {
    const NAME: &'static str = "door-locked";
}

/// A level finished loading and is now active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSceneReady {
    pub level: String,
    /// Keys the door of this level asks for.
    pub required_keys: u32,
}

impl BusEvent for CurrentSceneReady {
    const NAME: &'static str = "current-scene-ready";
}

/// A level could not be loaded; no part of it was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelLoadFailed {
    pub level: String,
    pub reason: String,
}

impl BusEvent for LevelLoadFailed {
    const NAME: &'static str = "level-load-failed";
}

/// The last level was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameCleared;

impl BusEvent for GameCleared {
    const NAME: &'static str = "game-cleared";
}

/// The run ended because mental health was depleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver;

impl BusEvent for GameOver {
    const NAME: &'static str = "game-over";
}
