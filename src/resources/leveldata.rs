//! Level layout data and sources.
//!
//! A [`LevelLayout`] is the boundary between the map/tileset collaborator and
//! the [`LevelController`](crate::level::LevelController): bounds, spawn
//! points, keys and doors. Layouts are loaded through a [`LevelSource`];
//! [`JsonLevelSource`] reads `<dir>/<name>.json` files and
//! [`MemoryLevelSource`] serves layouts built in code.
//!
//! # JSON format
//!
//! ```json
//! {
//!   "name": "level1",
//!   "width": 1280, "height": 1280,
//!   "player": { "x": 350, "y": 700 },
//!   "enemies": [ { "x": 450, "y": 500, "kind": "sound_seeking" } ],
//!   "keys": [ { "x": 900, "y": 300 } ],
//!   "doors": [ { "x": 1100, "y": 200 } ],
//!   "required_keys": 1
//! }
//! ```
//!
//! A layout that is missing or fails validation is fatal to the load; no
//! partial level is ever started.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use glam::Vec2;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::enemy::EnemyKind;

/// Why a level could not be loaded.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level asset '{0}' not found")]
    AssetMissing(String),
    #[error("failed to read level '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("level '{name}' is malformed: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("level '{name}' is invalid: {reason}")]
    Invalid { name: String, reason: String },
}

/// A point in level coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

impl SpawnPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Enemy spawn point with its behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub x: f32,
    pub y: f32,
    pub kind: EnemyKind,
}

fn default_required_keys() -> u32 {
    1
}

/// Everything the controller needs to build one level instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub player: SpawnPoint,
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    pub keys: Vec<SpawnPoint>,
    pub doors: Vec<SpawnPoint>,
    #[serde(default = "default_required_keys")]
    pub required_keys: u32,
}

impl LevelLayout {
    /// Check the layout can be played.
    pub fn validate(&self) -> Result<(), LevelError> {
        let invalid = |reason: String| LevelError::Invalid {
            name: self.name.clone(),
            reason,
        };

        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(invalid(format!(
                "bounds must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.doors.is_empty() {
            return Err(invalid("no door trigger".to_string()));
        }
        if self.keys.is_empty() {
            return Err(invalid("no key object".to_string()));
        }
        if self.required_keys as usize > self.keys.len() {
            return Err(invalid(format!(
                "requires {} keys but only {} exist",
                self.required_keys,
                self.keys.len()
            )));
        }

        let inside = |p: Vec2| p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height;
        let points = std::iter::once(("player", self.player.pos()))
            .chain(self.enemies.iter().map(|e| ("enemy", Vec2::new(e.x, e.y))))
            .chain(self.keys.iter().map(|k| ("key", k.pos())))
            .chain(self.doors.iter().map(|d| ("door", d.pos())));
        for (what, point) in points {
            if !inside(point) {
                return Err(invalid(format!("{what} at {point} is outside the level")));
            }
        }
        Ok(())
    }
}

/// Provider of level layouts by name.
pub trait LevelSource {
    fn load(&self, name: &str) -> Result<LevelLayout, LevelError>;
}

/// Parse a layout from JSON text.
pub fn parse_layout(name: &str, text: &str) -> Result<LevelLayout, LevelError> {
    serde_json::from_str(text).map_err(|source| LevelError::Parse {
        name: name.to_string(),
        source,
    })
}

/// Loads `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct JsonLevelSource {
    dir: PathBuf,
}

impl JsonLevelSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}

impl LevelSource for JsonLevelSource {
    fn load(&self, name: &str) -> Result<LevelLayout, LevelError> {
        let path = self.path_for(name);
        debug!("Loading level '{name}' from {}", path.display());
        let text = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                LevelError::AssetMissing(name.to_string())
            } else {
                LevelError::Io {
                    name: name.to_string(),
                    source,
                }
            }
        })?;
        parse_layout(name, &text)
    }
}

/// In-memory registry of layouts keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLevelSource {
    layouts: FxHashMap<String, LevelLayout>,
}

impl MemoryLevelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a layout under its own name.
    pub fn insert(&mut self, layout: LevelLayout) {
        self.layouts.insert(layout.name.clone(), layout);
    }

    pub fn with(mut self, layout: LevelLayout) -> Self {
        self.insert(layout);
        self
    }
}

impl LevelSource for MemoryLevelSource {
    fn load(&self, name: &str) -> Result<LevelLayout, LevelError> {
        self.layouts
            .get(name)
            .cloned()
            .ok_or_else(|| LevelError::AssetMissing(name.to_string()))
    }
}
