//! Hushbound headless runner.
//!
//! Runs the stealth core without a renderer: a synthetic microphone feeds
//! the sampler, an autopilot walks the player to the keys and then the door,
//! and progress is logged once per second.
//!
//! Three cadences run side by side, each through its own entry point:
//! - audio: [`SignalSampler::poll`] on the capture bridge
//! - timer: [`MentalHealthTimer::advance`] with the frame's wall time
//! - frames: [`Game::frame`]
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --release -- --seconds 30 --levels level1,level2
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use clap::Parser;
use glam::Vec2;
use log::{info, warn};

use hushbound::components::mapposition::MapPosition;
use hushbound::components::pickup::{Door, Key};
use hushbound::events::bus::EventBus;
use hushbound::events::gamestate::StartGame;
use hushbound::game::{Game, GameFlow};
use hushbound::hud::Hud;
use hushbound::level::LevelController;
use hushbound::mentaltimer::MentalHealthTimer;
use hushbound::resources::capture::{AudioBlock, setup_capture, shutdown_capture};
use hushbound::resources::gameconfig::GameConfig;
use hushbound::resources::leveldata::JsonLevelSource;
use hushbound::sampler::{NoCapture, SignalSampler};

/// Period of one captured block (2048 samples at 44.1 kHz).
const AUDIO_BLOCK_PERIOD: Duration = Duration::from_millis(46);
const SYNTHETIC_BINS: usize = 64;

#[derive(Parser)]
#[command(version, about = "Headless runner for the hushbound stealth core")]
struct Cli {
    /// Path to the INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Comma-separated level names, overriding the config file.
    #[arg(long, value_delimiter = ',')]
    levels: Option<Vec<String>>,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Frame rate of the physics cadence.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Run without a microphone.
    #[arg(long)]
    silent: bool,
}

/// Mostly quiet room noise with occasional loud bursts.
fn synthetic_microphone() -> impl FnMut() -> Option<AudioBlock> + Send + 'static {
    let mut rng = fastrand::Rng::new();
    move || {
        let base = if rng.u8(..) < 40 { 120 } else { 20 };
        Some((0..SYNTHETIC_BINS).map(|_| base + rng.u8(..40)).collect())
    }
}

fn nearest(from: Vec2, candidates: impl Iterator<Item = Vec2>) -> Option<Vec2> {
    candidates.min_by(|a, b| from.distance_squared(*a).total_cmp(&from.distance_squared(*b)))
}

/// Walk to the nearest uncollected key, or to the nearest door once the
/// required keys are held.
fn autopilot(level: &LevelController) -> Vec2 {
    let world = level.world();
    let player = level.player_position();
    let goal = if level.has_required_keys() {
        world
            .try_query_filtered::<&MapPosition, With<Door>>()
            .and_then(|mut q| nearest(player, q.iter(world).map(|p| p.pos)))
    } else {
        world.try_query::<(&Key, &MapPosition)>().and_then(|mut q| {
            nearest(
                player,
                q.iter(world)
                    .filter(|(key, _)| !key.collected)
                    .map(|(_, p)| p.pos),
            )
        })
    };
    goal.map_or(Vec2::ZERO, |goal| goal - player)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{e}; using defaults");
    }
    if let Some(levels) = cli.levels {
        config.levels = levels;
    }

    log::info!("Hushbound headless run: {:?}", config.levels);
    let bus = EventBus::new();
    let mut hud = Hud::attach(&bus, &config);
    let mut timer = MentalHealthTimer::new(&bus, config.timer, config.sound.threshold);
    let mut sampler = SignalSampler::new(&bus, config.sound.bin_count);
    let source = JsonLevelSource::new(&config.levels_dir);
    let mut game = Game::new(&bus, config, Box::new(source));

    let mut capture = if cli.silent {
        None
    } else {
        Some(setup_capture(AUDIO_BLOCK_PERIOD, synthetic_microphone()))
    };

    bus.publish(StartGame);

    let frame_time = Duration::from_secs_f32(1.0 / cli.fps.max(1) as f32);
    let started = Instant::now();
    let mut last = started;
    let mut reported_second = 0;
    loop {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        match capture.as_mut() {
            Some(capture) => sampler.poll(&mut capture.bridge),
            None => sampler.poll(&mut NoCapture),
        };

        timer.advance(dt);

        if let Some(level) = game.level_mut() {
            let direction = autopilot(level);
            level.set_player_intent(direction);
        }
        let flow = game.frame(dt);
        if flow != GameFlow::Playing {
            break;
        }

        let elapsed = started.elapsed().as_secs_f32();
        if elapsed as u64 > reported_second {
            reported_second = elapsed as u64;
            let (held, required) = hud.keys();
            info!(
                "t={reported_second}s level={} health={:.1} ({:?}) vision={:.0} sound={:.0} keys={held}/{required} {}",
                game.level().map_or("-", |l| l.name()),
                hud.health().value(),
                hud.timer_tier(),
                hud.vision_radius(),
                hud.sound_level().value(),
                hud.status_line(),
            );
        }
        if elapsed >= cli.seconds {
            info!("Time limit reached");
            break;
        }

        std::thread::sleep(frame_time.saturating_sub(now.elapsed()));
    }

    info!("Run finished: {:?}", game.flow());
    drop(game);
    if let Some(capture) = capture {
        shutdown_capture(capture);
    }
    timer.detach();
    hud.detach();
}
