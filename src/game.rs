//! Game flow across levels.
//!
//! [`Game`] sits above the [`LevelController`]: it owns the ordered level
//! list, starts the run on [`StartGame`], hands off from one level to the next
//! when a door opens, and ends the run with [`GameCleared`] or [`GameOver`].
//! The mental health timer is not owned here; the game only talks to it
//! through [`ResetTimer`].

use std::cell::Cell;
use std::rc::Rc;

use log::{error, info, warn};
use smallvec::SmallVec;

use crate::events::bus::{EventBus, Subscription};
use crate::events::gamestate::{GameCleared, GameOver, LevelLoadFailed, StartGame};
use crate::events::sound::SoundThresholdChanged;
use crate::events::timer::ResetTimer;
use crate::level::{LevelController, LevelExit, LevelPhase};
use crate::resources::gameconfig::GameConfig;
use crate::resources::leveldata::LevelSource;
use crate::resources::sound::SoundThreshold;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameFlow {
    #[default]
    Menu,
    Playing,
    Victory,
    GameOver,
    LoadFailed,
}

pub struct Game {
    bus: EventBus,
    config: GameConfig,
    source: Box<dyn LevelSource>,
    current: usize,
    level: Option<LevelController>,
    flow: GameFlow,
    threshold: Rc<Cell<SoundThreshold>>,
    start_requested: Rc<Cell<bool>>,
    subscriptions: SmallVec<[Subscription; 2]>,
}

impl Game {
    pub fn new(bus: &EventBus, config: GameConfig, source: Box<dyn LevelSource>) -> Self {
        let threshold = Rc::new(Cell::new(config.sound.threshold));
        let start_requested = Rc::new(Cell::new(false));
        let mut subscriptions = SmallVec::new();

        let requested = start_requested.clone();
        subscriptions.push(bus.subscribe(move |_: &StartGame| {
            requested.set(true);
            Ok(())
        }));
        let current = threshold.clone();
        subscriptions.push(bus.subscribe(move |e: &SoundThresholdChanged| {
            current.set(e.0);
            Ok(())
        }));

        Self {
            bus: bus.clone(),
            config,
            source,
            current: 0,
            level: None,
            flow: GameFlow::Menu,
            threshold,
            start_requested,
            subscriptions,
        }
    }

    /// Start a new run from the first level, abandoning any level in progress.
    pub fn start(&mut self) {
        self.start_requested.set(false);
        if let Some(mut level) = self.level.take() {
            level.shutdown();
        }
        info!("Starting game with levels {:?}", self.config.levels);
        self.current = 0;
        self.bus.publish(ResetTimer);
        self.load_current();
    }

    /// Drive the current level by `dt` seconds and handle level handoff.
    pub fn frame(&mut self, dt: f32) -> GameFlow {
        self.config.sound.threshold = self.threshold.get();
        if self.start_requested.get() {
            self.start();
        }
        if self.flow != GameFlow::Playing {
            return self.flow;
        }
        let Some(level) = self.level.as_mut() else {
            return self.flow;
        };

        match level.update(dt) {
            LevelPhase::Finished(LevelExit::NextLevel) => {
                self.level = None;
                self.current += 1;
                self.load_current();
            }
            LevelPhase::Finished(LevelExit::Cleared) => {
                self.level = None;
                self.flow = GameFlow::Victory;
                info!("All levels cleared");
                self.bus.publish(GameCleared);
            }
            LevelPhase::Failed => {
                self.level = None;
                self.flow = GameFlow::GameOver;
                info!("Game over");
                self.bus.publish(GameOver);
            }
            LevelPhase::Loading | LevelPhase::Active | LevelPhase::Transitioning => {}
        }
        self.flow
    }

    /// Clamp `value` into the threshold band and broadcast it.
    pub fn set_sound_threshold(&mut self, value: f32) -> SoundThreshold {
        self.config.set_threshold(value);
        let threshold = self.config.sound.threshold;
        self.bus.publish(SoundThresholdChanged(threshold));
        threshold
    }

    /// Persist the current threshold to the config file, including changes
    /// other publishers made through [`SoundThresholdChanged`].
    pub fn save_settings(&mut self) {
        self.config.sound.threshold = self.threshold.get();
        if let Err(e) = self.config.save_to_file() {
            warn!("Could not save settings: {e}");
        }
    }

    pub fn flow(&self) -> GameFlow {
        self.flow
    }

    pub fn threshold(&self) -> SoundThreshold {
        self.threshold.get()
    }

    pub fn level(&self) -> Option<&LevelController> {
        self.level.as_ref()
    }

    pub fn level_mut(&mut self) -> Option<&mut LevelController> {
        self.level.as_mut()
    }

    /// Index of the current level in the configured list.
    pub fn level_index(&self) -> usize {
        self.current
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    fn load_current(&mut self) {
        let Some(name) = self.config.levels.get(self.current).cloned() else {
            self.fail_load(String::new(), "no levels configured".to_string());
            return;
        };
        match LevelController::load(
            &name,
            self.source.as_ref(),
            &self.config,
            &self.bus,
            self.threshold.get(),
        ) {
            Ok(mut level) => {
                level.set_final(self.current + 1 >= self.config.levels.len());
                self.level = Some(level);
                self.flow = GameFlow::Playing;
            }
            Err(e) => self.fail_load(name, e.to_string()),
        }
    }

    fn fail_load(&mut self, level: String, reason: String) {
        error!("Could not load level '{level}': {reason}");
        self.level = None;
        self.flow = GameFlow::LoadFailed;
        self.bus.publish(LevelLoadFailed { level, reason });
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        if let Some(mut level) = self.level.take() {
            level.shutdown();
        }
        for subscription in self.subscriptions.drain(..) {
            self.bus.unsubscribe(subscription);
        }
    }
}
