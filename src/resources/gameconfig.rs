//! Game configuration resource.
//!
//! Manages gameplay constants loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [timer]
//! tick_ms = 100
//! base_decay = 0.1
//! alert_multiplier = 3
//! alert_duration_ms = 1000
//! bonus_scale = 0.1
//! bonus_cap = 5
//! bonus_cooldown_ms = 500
//!
//! [enemies]
//! base_speed = 70
//! passive_speed = 70
//! speed_divisor = 50
//! speed_cap = 1.5
//! alert_distance = 75
//!
//! [sound]
//! threshold = 60
//! bin_count = 50
//!
//! [level]
//! player_speed = 175
//! key_radius = 24
//! door_distance = 50
//! key_arm_delay_ms = 100
//!
//! [vision]
//! base_radius = 150
//! halo_width = 20
//!
//! [game]
//! levels = level1,level2
//! levels_dir = assets/levels
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;
use thiserror::Error;

use crate::resources::sound::SoundThreshold;

const DEFAULT_CONFIG_PATH: &str = "./config.ini";
const DEFAULT_LEVELS_DIR: &str = "assets/levels";
const DEFAULT_LEVELS: [&str; 2] = ["level1", "level2"];

/// Failure to read or write the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    Load(String),
    #[error("failed to save config file: {0}")]
    Save(#[from] std::io::Error),
}

/// Mental health timer constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerConfig {
    /// Fixed tick period in milliseconds.
    pub tick_ms: f32,
    /// Amount subtracted per tick while no alert is active.
    pub base_decay: f32,
    /// Decay multiplier while an enemy alert is active.
    pub alert_multiplier: f32,
    /// How long a single enemy alert keeps the elevated decay, in ms.
    pub alert_duration_ms: f32,
    /// Bonus per unit of sound above the threshold.
    pub bonus_scale: f32,
    /// Largest bonus a single application may add.
    pub bonus_cap: f32,
    /// Minimum time between two bonus applications, in ms.
    pub bonus_cooldown_ms: f32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100.0,
            base_decay: 0.1,
            alert_multiplier: 3.0,
            alert_duration_ms: 1000.0,
            bonus_scale: 0.1,
            bonus_cap: 5.0,
            bonus_cooldown_ms: 500.0,
        }
    }
}

/// Enemy movement constants, copied into every spawned enemy.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct EnemyConfig {
    /// Speed of sound-driven enemies at multiplier 1, in units per second.
    pub base_speed: f32,
    /// Fixed speed of passive pursuers.
    pub passive_speed: f32,
    /// Divisor `k` turning sound into a speed multiplier.
    pub speed_divisor: f32,
    /// Upper bound of the speed multiplier.
    pub speed_cap: f32,
    /// Distance under which an enemy raises the proximity alert.
    pub alert_distance: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            base_speed: 70.0,
            passive_speed: 70.0,
            speed_divisor: 50.0,
            speed_cap: 1.5,
            alert_distance: 75.0,
        }
    }
}

/// Sound sampling constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundConfig {
    /// Threshold in effect before the player touches the settings.
    pub threshold: SoundThreshold,
    /// Number of low-frequency bins averaged into one sound level.
    pub bin_count: usize,
    /// Sound level that fills the HUD meter.
    pub meter_full_scale: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            threshold: SoundThreshold::DEFAULT,
            bin_count: 50,
            meter_full_scale: 128.0,
        }
    }
}

/// Level interaction constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelConfig {
    pub player_speed: f32,
    /// Overlap radius for picking up a key.
    pub key_radius: f32,
    /// Distance at which a door reacts to the player.
    pub door_distance: f32,
    /// Keys cannot be picked up until this long after the level starts.
    pub key_arm_delay_ms: f32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            player_speed: 175.0,
            key_radius: 24.0,
            door_distance: 50.0,
            key_arm_delay_ms: 100.0,
        }
    }
}

/// Vision circle constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionConfig {
    pub base_radius: f32,
    /// Width of the soft ring drawn outside the vision radius.
    pub halo_width: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_radius: 150.0,
            halo_width: 20.0,
        }
    }
}

/// Game configuration resource.
///
/// Groups every tunable constant of the core. Missing keys in the INI file
/// keep their default value.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub timer: TimerConfig,
    pub enemies: EnemyConfig,
    pub sound: SoundConfig,
    pub level: LevelConfig,
    pub vision: VisionConfig,
    /// Level names in play order.
    pub levels: Vec<String>,
    /// Directory holding `<level>.json` layouts.
    pub levels_dir: PathBuf,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_f32(config: &Ini, section: &str, key: &str, target: &mut f32) {
    match config.getfloat(section, key) {
        Ok(Some(value)) if value.is_finite() => *target = value as f32,
        Ok(Some(_)) | Ok(None) => {}
        Err(e) => warn!("Ignoring [{section}] {key}: {e}"),
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            timer: TimerConfig::default(),
            enemies: EnemyConfig::default(),
            sound: SoundConfig::default(),
            level: LevelConfig::default(),
            vision: VisionConfig::default(),
            levels: DEFAULT_LEVELS.iter().map(|s| s.to_string()).collect(),
            levels_dir: PathBuf::from(DEFAULT_LEVELS_DIR),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(ConfigError::Load)?;

        // [timer] section
        read_f32(&config, "timer", "tick_ms", &mut self.timer.tick_ms);
        read_f32(&config, "timer", "base_decay", &mut self.timer.base_decay);
        read_f32(&config, "timer", "alert_multiplier", &mut self.timer.alert_multiplier);
        read_f32(&config, "timer", "alert_duration_ms", &mut self.timer.alert_duration_ms);
        read_f32(&config, "timer", "bonus_scale", &mut self.timer.bonus_scale);
        read_f32(&config, "timer", "bonus_cap", &mut self.timer.bonus_cap);
        read_f32(&config, "timer", "bonus_cooldown_ms", &mut self.timer.bonus_cooldown_ms);
        if self.timer.tick_ms <= 0.0 {
            warn!("[timer] tick_ms must be positive, using default");
            self.timer.tick_ms = TimerConfig::default().tick_ms;
        }

        // [enemies] section
        read_f32(&config, "enemies", "base_speed", &mut self.enemies.base_speed);
        read_f32(&config, "enemies", "passive_speed", &mut self.enemies.passive_speed);
        read_f32(&config, "enemies", "speed_divisor", &mut self.enemies.speed_divisor);
        read_f32(&config, "enemies", "speed_cap", &mut self.enemies.speed_cap);
        read_f32(&config, "enemies", "alert_distance", &mut self.enemies.alert_distance);

        // [sound] section
        let mut threshold = self.sound.threshold.value();
        read_f32(&config, "sound", "threshold", &mut threshold);
        self.sound.threshold = SoundThreshold::new(threshold);
        if let Some(bins) = config.getuint("sound", "bin_count").ok().flatten() {
            self.sound.bin_count = (bins as usize).max(1);
        }
        read_f32(&config, "sound", "meter_full_scale", &mut self.sound.meter_full_scale);

        // [level] section
        read_f32(&config, "level", "player_speed", &mut self.level.player_speed);
        read_f32(&config, "level", "key_radius", &mut self.level.key_radius);
        read_f32(&config, "level", "door_distance", &mut self.level.door_distance);
        read_f32(&config, "level", "key_arm_delay_ms", &mut self.level.key_arm_delay_ms);

        // [vision] section
        read_f32(&config, "vision", "base_radius", &mut self.vision.base_radius);
        read_f32(&config, "vision", "halo_width", &mut self.vision.halo_width);

        // [game] section
        if let Some(levels) = config.get("game", "levels") {
            let levels: Vec<String> = levels
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if levels.is_empty() {
                warn!("[game] levels is empty, keeping {:?}", self.levels);
            } else {
                self.levels = levels;
            }
        }
        if let Some(dir) = config.get("game", "levels_dir") {
            self.levels_dir = PathBuf::from(dir);
        }

        info!(
            "Loaded config: tick={}ms decay={} threshold={} alert_distance={} levels={:?}",
            self.timer.tick_ms,
            self.timer.base_decay,
            self.sound.threshold.value(),
            self.enemies.alert_distance,
            self.levels
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        let mut set = |section: &str, key: &str, value: String| {
            config.set(section, key, Some(value));
        };

        set("timer", "tick_ms", self.timer.tick_ms.to_string());
        set("timer", "base_decay", self.timer.base_decay.to_string());
        set("timer", "alert_multiplier", self.timer.alert_multiplier.to_string());
        set("timer", "alert_duration_ms", self.timer.alert_duration_ms.to_string());
        set("timer", "bonus_scale", self.timer.bonus_scale.to_string());
        set("timer", "bonus_cap", self.timer.bonus_cap.to_string());
        set("timer", "bonus_cooldown_ms", self.timer.bonus_cooldown_ms.to_string());

        set("enemies", "base_speed", self.enemies.base_speed.to_string());
        set("enemies", "passive_speed", self.enemies.passive_speed.to_string());
        set("enemies", "speed_divisor", self.enemies.speed_divisor.to_string());
        set("enemies", "speed_cap", self.enemies.speed_cap.to_string());
        set("enemies", "alert_distance", self.enemies.alert_distance.to_string());

        set("sound", "threshold", self.sound.threshold.value().to_string());
        set("sound", "bin_count", self.sound.bin_count.to_string());
        set("sound", "meter_full_scale", self.sound.meter_full_scale.to_string());

        set("level", "player_speed", self.level.player_speed.to_string());
        set("level", "key_radius", self.level.key_radius.to_string());
        set("level", "door_distance", self.level.door_distance.to_string());
        set("level", "key_arm_delay_ms", self.level.key_arm_delay_ms.to_string());

        set("vision", "base_radius", self.vision.base_radius.to_string());
        set("vision", "halo_width", self.vision.halo_width.to_string());

        set("game", "levels", self.levels.join(","));
        set("game", "levels_dir", self.levels_dir.display().to_string());

        config.write(&self.config_path)?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Change the startup threshold, clamped into its band.
    pub fn set_threshold(&mut self, value: f32) {
        self.sound.threshold = SoundThreshold::new(value);
    }
}
