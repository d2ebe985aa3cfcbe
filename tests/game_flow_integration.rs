//! Game flow integration tests: level handoff, victory, game over and load
//! failure, driven frame by frame the way the runner drives them.

#![allow(dead_code, unused_imports)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hushbound::events::bus::{BusEvent, EventBus};
use hushbound::events::gamestate::{
    CurrentSceneReady, GameCleared, GameOver, LevelLoadFailed, StartGame,
};
use hushbound::events::timer::ResetTimer;
use hushbound::game::{Game, GameFlow};
use hushbound::mentaltimer::MentalHealthTimer;
use hushbound::resources::gameconfig::{GameConfig, TimerConfig};
use hushbound::resources::leveldata::{LevelLayout, MemoryLevelSource, SpawnPoint};
use hushbound::resources::mentalhealth::MentalHealth;
use hushbound::resources::sound::SoundThreshold;

const FRAME: f32 = 0.05;

/// A level whose only key lies under the player and whose door is in reach,
/// so it clears on the first tick the keys are armed.
fn short_level(name: &str) -> LevelLayout {
    LevelLayout {
        name: name.to_string(),
        width: 300.0,
        height: 300.0,
        player: SpawnPoint::new(100.0, 100.0),
        enemies: Vec::new(),
        keys: vec![SpawnPoint::new(100.0, 100.0)],
        doors: vec![SpawnPoint::new(120.0, 100.0)],
        required_keys: 1,
    }
}

/// A level the player cannot finish without moving.
fn long_level(name: &str) -> LevelLayout {
    LevelLayout {
        keys: vec![SpawnPoint::new(280.0, 280.0)],
        doors: vec![SpawnPoint::new(20.0, 280.0)],
        ..short_level(name)
    }
}

fn config(levels: &[&str]) -> GameConfig {
    let mut config = GameConfig::new();
    config.levels = levels.iter().map(|s| s.to_string()).collect();
    config
}

fn count<E: BusEvent>(bus: &EventBus) -> Rc<Cell<u32>> {
    let counter = Rc::new(Cell::new(0));
    let sink = counter.clone();
    bus.subscribe(move |_: &E| {
        sink.set(sink.get() + 1);
        Ok(())
    });
    counter
}

#[test]
fn two_levels_hand_off_and_clear_the_game() {
    let bus = EventBus::new();
    let scenes = Rc::new(RefCell::new(Vec::new()));
    let sink = scenes.clone();
    bus.subscribe(move |e: &CurrentSceneReady| {
        sink.borrow_mut().push(e.level.clone());
        Ok(())
    });
    let resets = count::<ResetTimer>(&bus);
    let cleared = count::<GameCleared>(&bus);

    let source = MemoryLevelSource::new()
        .with(short_level("first"))
        .with(short_level("second"));
    let mut game = Game::new(&bus, config(&["first", "second"]), Box::new(source));
    assert_eq!(game.frame(FRAME), GameFlow::Menu);

    bus.publish(StartGame);
    assert_eq!(game.frame(FRAME), GameFlow::Playing);
    assert_eq!(game.level_index(), 0);

    // Second tick arms the key, which opens the door and loads the next level.
    assert_eq!(game.frame(FRAME), GameFlow::Playing);
    assert_eq!(game.level_index(), 1);
    assert_eq!(game.level().map(|l| l.name()), Some("second"));

    assert_eq!(game.frame(FRAME), GameFlow::Playing);
    assert_eq!(game.frame(FRAME), GameFlow::Victory);
    assert!(game.level().is_none());

    // Further frames are inert.
    assert_eq!(game.frame(FRAME), GameFlow::Victory);

    assert_eq!(*scenes.borrow(), vec!["first".to_string(), "second".to_string()]);
    // Once on start, once per door.
    assert_eq!(resets.get(), 3);
    assert_eq!(cleared.get(), 1);
}

#[test]
fn depleted_timer_ends_the_game() {
    let bus = EventBus::new();
    let over = count::<GameOver>(&bus);
    let timer_config = TimerConfig {
        base_decay: 50.0,
        ..TimerConfig::default()
    };
    let mut timer = MentalHealthTimer::new(&bus, timer_config, SoundThreshold::DEFAULT);

    let source = MemoryLevelSource::new().with(long_level("first"));
    let mut game = Game::new(&bus, config(&["first"]), Box::new(source));
    bus.publish(StartGame);
    assert_eq!(game.frame(FRAME), GameFlow::Playing);

    timer.advance(0.2);
    assert!(timer.is_depleted());

    assert_eq!(game.frame(FRAME), GameFlow::GameOver);
    assert_eq!(over.get(), 1);
    assert!(game.level().is_none());
    assert_eq!(game.frame(FRAME), GameFlow::GameOver);
    assert_eq!(over.get(), 1);
    timer.detach();
}

#[test]
fn restart_after_game_over_resets_the_timer() {
    let bus = EventBus::new();
    let timer_config = TimerConfig {
        base_decay: 50.0,
        ..TimerConfig::default()
    };
    let mut timer = MentalHealthTimer::new(&bus, timer_config, SoundThreshold::DEFAULT);
    let source = MemoryLevelSource::new().with(long_level("first"));
    let mut game = Game::new(&bus, config(&["first"]), Box::new(source));

    bus.publish(StartGame);
    game.frame(FRAME);
    timer.advance(0.2);
    assert_eq!(game.frame(FRAME), GameFlow::GameOver);

    bus.publish(StartGame);
    assert_eq!(game.frame(FRAME), GameFlow::Playing);
    assert_eq!(timer.health(), MentalHealth::FULL);
    assert!(!timer.is_depleted());
    timer.detach();
}

#[test]
fn missing_second_level_reports_load_failure() {
    let bus = EventBus::new();
    let failures = Rc::new(RefCell::new(Vec::new()));
    let sink = failures.clone();
    bus.subscribe(move |e: &LevelLoadFailed| {
        sink.borrow_mut().push(e.level.clone());
        Ok(())
    });
    let cleared = count::<GameCleared>(&bus);

    let source = MemoryLevelSource::new().with(short_level("first"));
    let mut game = Game::new(&bus, config(&["first", "vault"]), Box::new(source));
    bus.publish(StartGame);
    game.frame(FRAME);

    assert_eq!(game.frame(FRAME), GameFlow::LoadFailed);
    assert_eq!(*failures.borrow(), vec!["vault".to_string()]);
    assert_eq!(cleared.get(), 0);
    assert!(game.level().is_none());
}

#[test]
fn threshold_set_before_start_reaches_the_level() {
    let bus = EventBus::new();
    let source = MemoryLevelSource::new().with(long_level("first"));
    let mut game = Game::new(&bus, config(&["first"]), Box::new(source));

    game.set_sound_threshold(90.0);
    bus.publish(StartGame);
    game.frame(FRAME);

    assert_eq!(game.threshold(), SoundThreshold::new(90.0));
    let level = game.level().unwrap();
    assert_eq!(level.name(), "first");
}
