//! Level lifecycle and per-tick orchestration.
//!
//! A [`LevelController`] owns one level instance: an ECS [`World`] holding the
//! player, enemies, keys and doors, plus the [`Schedule`] that advances them.
//! It is driven on the render/physics cadence through
//! [`LevelController::update`] and turns what the systems report into bus
//! events.
//!
//! # Phases
//!
//! ```text
//! Loading -> Active -> Transitioning -> Finished(NextLevel | Cleared)
//!    \          \           \
//!     +----------+-----------+--> Failed   (on TimerEnded)
//! ```
//!
//! Leaving `Active` always tears the level down: every enemy is destroyed
//! (which unsubscribes it) and despawned, and the controller drops its own
//! handlers, so a finished level leaves nothing registered on the bus.

use std::cell::Cell;
use std::rc::Rc;

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{debug, info, warn};
use smallvec::SmallVec;

use crate::components::enemy::Enemy;
use crate::components::mapposition::MapPosition;
use crate::components::pickup::{Door, Key};
use crate::components::player::{Player, PlayerIntent};
use crate::components::rigidbody::RigidBody;
use crate::events::bus::{EventBus, Subscription};
use crate::events::gamestate::{CurrentSceneReady, DoorLocked, KeyCollected};
use crate::events::sound::SoundLevelChanged;
use crate::events::timer::{EnemyNear, ResetTimer, TimerEnded};
use crate::resources::gameconfig::GameConfig;
use crate::resources::leveldata::{LevelError, LevelSource};
use crate::resources::levelstate::{DoorReport, KeyRing, LevelBounds, LevelRules, ProximityReport};
use crate::resources::sound::{CurrentSoundLevel, SoundLevel, SoundThreshold};
use crate::resources::worldtime::WorldTime;
use crate::systems::enemy::enemy_behavior_system;
use crate::systems::movement::movement_system;
use crate::systems::pickup::{door_check_system, key_pickup_system};
use crate::systems::player::player_control_system;
use crate::systems::proximity::proximity_system;
use crate::systems::time::update_world_time;

/// How a level was left through its door.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelExit {
    NextLevel,
    /// The last level of the game was cleared.
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelPhase {
    Loading,
    Active,
    Transitioning,
    Finished(LevelExit),
    Failed,
}

impl LevelPhase {
    /// `Finished` or `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, LevelPhase::Finished(_) | LevelPhase::Failed)
    }
}

pub struct LevelController {
    name: String,
    bus: EventBus,
    world: World,
    schedule: Schedule,
    player: Entity,
    phase: Rc<Cell<LevelPhase>>,
    sound: Rc<Cell<SoundLevel>>,
    subscriptions: SmallVec<[Subscription; 2]>,
    final_level: bool,
    torn_down: bool,
    tick: u64,
    alert_visible: bool,
}

impl LevelController {
    /// Load and start the level `name`.
    ///
    /// The layout is validated before anything is spawned or subscribed, so a
    /// failed load leaves no trace on the bus.
    pub fn load(
        name: &str,
        source: &dyn LevelSource,
        config: &GameConfig,
        bus: &EventBus,
        threshold: SoundThreshold,
    ) -> Result<Self, LevelError> {
        info!("Loading level '{name}'");
        let layout = source.load(name)?;
        layout.validate()?;

        let phase = Rc::new(Cell::new(LevelPhase::Loading));
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(LevelRules::from_config(config));
        world.insert_resource(LevelBounds::new(layout.width, layout.height));
        world.insert_resource(CurrentSoundLevel::default());
        world.insert_resource(ProximityReport::default());
        world.insert_resource(KeyRing::new(layout.required_keys));
        world.insert_resource(DoorReport::default());

        let player = world
            .spawn((
                Player::new(config.level.player_speed),
                PlayerIntent::default(),
                MapPosition::new(layout.player.x, layout.player.y),
                RigidBody::with_max_speed(config.level.player_speed),
            ))
            .id();
        for spawn in &layout.enemies {
            world.spawn((
                Enemy::spawn(spawn.kind, player, threshold, config.enemies, bus),
                MapPosition::new(spawn.x, spawn.y),
                RigidBody::new(),
            ));
        }
        for key in &layout.keys {
            world.spawn((Key::default(), MapPosition::new(key.x, key.y)));
        }
        for door in &layout.doors {
            world.spawn((Door, MapPosition::new(door.x, door.y)));
        }
        debug!(
            "Level '{name}': {} enemies, {} keys ({} required), {} doors",
            layout.enemies.len(),
            layout.keys.len(),
            layout.required_keys,
            layout.doors.len()
        );

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                player_control_system,
                enemy_behavior_system,
                movement_system,
                proximity_system,
                key_pickup_system,
                door_check_system,
            )
                .chain(),
        );

        let sound = Rc::new(Cell::new(SoundLevel::SILENT));
        let mut subscriptions = SmallVec::new();
        let sink = sound.clone();
        subscriptions.push(bus.subscribe(move |e: &SoundLevelChanged| {
            sink.set(e.0);
            Ok(())
        }));
        let failed = phase.clone();
        let level_name = name.to_string();
        subscriptions.push(bus.subscribe(move |_: &TimerEnded| {
            if !failed.get().is_terminal() {
                info!("Level '{level_name}' failed: mental health depleted");
                failed.set(LevelPhase::Failed);
            }
            Ok(())
        }));

        phase.set(LevelPhase::Active);
        let controller = Self {
            name: name.to_string(),
            bus: bus.clone(),
            world,
            schedule,
            player,
            phase,
            sound,
            subscriptions,
            final_level: false,
            torn_down: false,
            tick: 0,
            alert_visible: false,
        };
        bus.publish(CurrentSceneReady {
            level: name.to_string(),
            required_keys: layout.required_keys,
        });
        Ok(controller)
    }

    /// Mark this level as the last one, so its door clears the game.
    pub fn set_final(&mut self, final_level: bool) {
        self.final_level = final_level;
    }

    /// Advance the level by `dt` seconds and return the resulting phase.
    pub fn update(&mut self, dt: f32) -> LevelPhase {
        match self.phase.get() {
            LevelPhase::Active => self.run_tick(dt),
            LevelPhase::Transitioning => self.finish(),
            LevelPhase::Failed => self.teardown(),
            LevelPhase::Loading | LevelPhase::Finished(_) => {}
        }
        self.phase.get()
    }

    fn run_tick(&mut self, dt: f32) {
        self.world.resource_mut::<CurrentSoundLevel>().0 = self.sound.get();
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
        self.tick += 1;

        let proximity = *self.world.resource::<ProximityReport>();
        self.alert_visible = proximity.near_count > 0;
        if self.alert_visible {
            self.bus.publish(EnemyNear { tick: self.tick });
        }

        let (collected, held, required) = {
            let mut ring = self.world.resource_mut::<KeyRing>();
            let collected = std::mem::take(&mut ring.collected_this_tick);
            (collected, ring.held, ring.required)
        };
        for n in 1..=collected {
            self.bus.publish(KeyCollected {
                held: held - collected + n,
                required,
            });
        }

        let door = *self.world.resource::<DoorReport>();
        if door.locked_contact_started {
            self.bus.publish(DoorLocked);
        }

        match self.phase.get() {
            LevelPhase::Active if door.unlocked => {
                info!("Level '{}' door opened", self.name);
                self.phase.set(LevelPhase::Transitioning);
                self.finish();
            }
            LevelPhase::Failed => self.teardown(),
            _ => {}
        }
    }

    fn finish(&mut self) {
        self.bus.publish(ResetTimer);
        self.teardown();
        // A depletion raised while resetting still wins.
        if self.phase.get() == LevelPhase::Transitioning {
            let exit = if self.final_level {
                LevelExit::Cleared
            } else {
                LevelExit::NextLevel
            };
            self.phase.set(LevelPhase::Finished(exit));
        }
    }

    /// Destroy every enemy and drop the controller's own handlers.
    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        let mut enemies = Vec::new();
        let mut query = self.world.query::<(Entity, &mut Enemy, &mut RigidBody)>();
        for (entity, mut enemy, mut rigidbody) in query.iter_mut(&mut self.world) {
            enemy.destroy(&self.bus);
            rigidbody.stop();
            enemies.push(entity);
        }
        for entity in &enemies {
            self.world.despawn(*entity);
        }
        if let Some(mut rigidbody) = self.world.get_mut::<RigidBody>(self.player) {
            rigidbody.freeze();
        }
        for subscription in self.subscriptions.drain(..) {
            self.bus.unsubscribe(subscription);
        }
        debug!(
            "Level '{}' torn down ({} enemies removed)",
            self.name,
            enemies.len()
        );
    }

    /// Tear the level down now, whatever its phase.
    pub fn shutdown(&mut self) {
        if !self.phase.get().is_terminal() {
            warn!("Level '{}' shut down while {:?}", self.name, self.phase.get());
        }
        self.teardown();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase.get()
    }

    /// Ticks run while active.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Whether the enemy alert marker should be shown.
    pub fn alert_visible(&self) -> bool {
        self.alert_visible
    }

    /// Distance of each live enemy to the player, as of the latest tick.
    pub fn enemy_distances(&self) -> Vec<f32> {
        let Some(mut query) = self.world.try_query::<&Enemy>() else {
            return Vec::new();
        };
        query
            .iter(&self.world)
            .filter(|enemy| !enemy.is_destroyed())
            .map(Enemy::distance_to_target)
            .collect()
    }

    pub fn live_enemy_count(&self) -> usize {
        let Some(mut query) = self.world.try_query::<&Enemy>() else {
            return 0;
        };
        query
            .iter(&self.world)
            .filter(|enemy| !enemy.is_destroyed())
            .count()
    }

    pub fn has_required_keys(&self) -> bool {
        self.world.resource::<KeyRing>().has_required()
    }

    pub fn keys_held(&self) -> u32 {
        self.world.resource::<KeyRing>().held
    }

    pub fn player_position(&self) -> Vec2 {
        self.world
            .get::<MapPosition>(self.player)
            .map_or(Vec2::ZERO, |p| p.pos)
    }

    /// Direction the player wants to walk in; applied on the next tick.
    pub fn set_player_intent(&mut self, direction: Vec2) {
        if let Some(mut intent) = self.world.get_mut::<PlayerIntent>(self.player) {
            intent.direction = direction;
        }
    }

    /// Move the player directly, kept inside the level bounds.
    pub fn set_player_position(&mut self, pos: Vec2) {
        let pos = self.world.resource::<LevelBounds>().clamp(pos);
        if let Some(mut position) = self.world.get_mut::<MapPosition>(self.player) {
            position.pos = pos;
        }
    }

    /// The level's ECS world, for render collaborators.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Drop for LevelController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::enemy::EnemyKind;
    use crate::resources::leveldata::{EnemySpawn, LevelLayout, MemoryLevelSource, SpawnPoint};

    fn layout() -> LevelLayout {
        LevelLayout {
            name: "cellar".to_string(),
            width: 400.0,
            height: 400.0,
            player: SpawnPoint::new(50.0, 50.0),
            enemies: vec![EnemySpawn {
                x: 300.0,
                y: 300.0,
                kind: EnemyKind::SoundSeeking,
            }],
            keys: vec![SpawnPoint::new(200.0, 50.0)],
            doors: vec![SpawnPoint::new(50.0, 350.0)],
            required_keys: 1,
        }
    }

    fn load(bus: &EventBus) -> LevelController {
        let source = MemoryLevelSource::new().with(layout());
        LevelController::load("cellar", &source, &GameConfig::new(), bus, SoundThreshold::DEFAULT)
            .unwrap()
    }

    #[test]
    fn test_load_spawns_and_activates() {
        let bus = EventBus::new();
        let level = load(&bus);
        assert_eq!(level.phase(), LevelPhase::Active);
        assert_eq!(level.live_enemy_count(), 1);
        assert_eq!(level.player_position(), Vec2::new(50.0, 50.0));
        // Enemy threshold handler, sound cache, depletion.
        assert_eq!(bus.total_listeners(), 3);
    }

    #[test]
    fn test_invalid_layout_leaves_no_subscriptions() {
        let bus = EventBus::new();
        let mut broken = layout();
        broken.doors.clear();
        let source = MemoryLevelSource::new().with(broken);
        let result =
            LevelController::load("cellar", &source, &GameConfig::new(), &bus, SoundThreshold::DEFAULT);
        assert!(matches!(result, Err(LevelError::Invalid { .. })));
        assert_eq!(bus.total_listeners(), 0);
    }

    #[test]
    fn test_timer_ended_fails_level_and_next_update_tears_down() {
        let bus = EventBus::new();
        let mut level = load(&bus);
        bus.publish(TimerEnded);
        assert_eq!(level.phase(), LevelPhase::Failed);
        assert_eq!(level.update(0.016), LevelPhase::Failed);
        assert_eq!(level.live_enemy_count(), 0);
        assert_eq!(bus.total_listeners(), 0);
    }

    #[test]
    fn test_player_position_is_clamped() {
        let bus = EventBus::new();
        let mut level = load(&bus);
        level.set_player_position(Vec2::new(-20.0, 900.0));
        assert_eq!(level.player_position(), Vec2::new(0.0, 400.0));
    }

    #[test]
    fn test_drop_unsubscribes_everything() {
        let bus = EventBus::new();
        let level = load(&bus);
        drop(level);
        assert_eq!(bus.total_listeners(), 0);
    }
}
