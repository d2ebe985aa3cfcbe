//! Mental health resource engine.
//!
//! [`MentalHealthTimer`] owns the player's [`MentalHealth`] and is the only
//! thing that ever changes it. It runs on its own fixed tick, independent of
//! the frame rate: [`MentalHealthTimer::advance`] accumulates wall time and
//! runs as many whole ticks as fit.
//!
//! # Tick pipeline
//!
//! Each tick evaluates [`RULES`] in order, clamping after every rule:
//!
//! 1. passive decay: `base_decay`, skipped while an enemy alert is armed
//! 2. proximity penalty: `base_decay * alert_multiplier` while the alert is armed
//! 3. sound bonus: at most once per cooldown, capped
//!
//! Only after all rules ran is the result checked for depletion, so a bonus
//! in the same tick can still rescue a player the decay pushed to zero. The
//! first tick that ends at zero publishes [`TimerEnded`]; the timer then halts
//! until a [`ResetTimer`] arrives. Every tick that runs publishes
//! [`TimerUpdate`].
//!
//! # Inputs
//!
//! All inputs arrive through the bus: [`EnemyNear`] arms (or refreshes) the
//! alert, [`SoundLevelChanged`] and [`SoundThresholdChanged`] feed the sound
//! bonus, [`IncreaseTimer`] requests a bonus directly and [`ResetTimer`]
//! restores full health.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info, trace, warn};
use smallvec::SmallVec;

use crate::events::bus::{EventBus, HandlerError, Subscription};
use crate::events::sound::{SoundLevelChanged, SoundThresholdChanged};
use crate::events::timer::{EnemyNear, IncreaseTimer, ResetTimer, TimerEnded, TimerUpdate};
use crate::resources::gameconfig::TimerConfig;
use crate::resources::mentalhealth::MentalHealth;
use crate::resources::sound::{SoundLevel, SoundThreshold};

/// Upper bound on ticks run by a single `advance`; the rest of a long stall
/// is dropped.
const MAX_CATCH_UP_TICKS: u32 = 240;

/// Everything a rule may look at for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInputs {
    pub base_decay: f32,
    pub alert_multiplier: f32,
    /// An enemy alert is armed for this tick.
    pub alert_active: bool,
    /// Bonus to add this tick, already capped and cooldown-checked.
    pub bonus: Option<f32>,
}

/// One step of the tick pipeline.
pub type Rule = fn(MentalHealth, &TickInputs) -> MentalHealth;

/// Rules in evaluation order.
pub const RULES: [(&str, Rule); 3] = [
    ("passive-decay", passive_decay),
    ("proximity-penalty", proximity_penalty),
    ("sound-bonus", sound_bonus),
];

pub fn passive_decay(health: MentalHealth, inputs: &TickInputs) -> MentalHealth {
    if inputs.alert_active {
        health
    } else {
        health.saturating_sub(inputs.base_decay)
    }
}

pub fn proximity_penalty(health: MentalHealth, inputs: &TickInputs) -> MentalHealth {
    if inputs.alert_active {
        health.saturating_sub(inputs.base_decay * inputs.alert_multiplier)
    } else {
        health
    }
}

pub fn sound_bonus(health: MentalHealth, inputs: &TickInputs) -> MentalHealth {
    match inputs.bonus {
        Some(amount) => health.saturating_add(amount),
        None => health,
    }
}

/// Run every rule over `health`.
pub fn evaluate(health: MentalHealth, inputs: &TickInputs) -> MentalHealth {
    RULES.iter().fold(health, |health, (name, rule)| {
        let next = rule(health, inputs);
        if next != health {
            trace!("{name}: {:.2} -> {:.2}", health.value(), next.value());
        }
        next
    })
}

/// Bonus earned by making noise: the excess over the threshold, scaled.
pub fn sound_bonus_amount(sound: SoundLevel, threshold: SoundThreshold, scale: f32) -> f32 {
    if threshold.is_exceeded_by(sound) {
        ((sound.value() - threshold.value()) * scale).max(0.0)
    } else {
        0.0
    }
}

#[derive(Debug)]
struct TimerState {
    config: TimerConfig,
    health: MentalHealth,
    sound: SoundLevel,
    threshold: SoundThreshold,
    tick: u64,
    accumulator_ms: f32,
    alert_remaining_ms: f32,
    /// `None` until the first bonus, so the first one is never held back.
    since_bonus_ms: Option<f32>,
    pending_increase: Option<f32>,
    depleted: bool,
}

impl TimerState {
    fn new(config: TimerConfig, health: MentalHealth, threshold: SoundThreshold) -> Self {
        Self {
            config,
            health,
            sound: SoundLevel::SILENT,
            threshold,
            tick: 0,
            accumulator_ms: 0.0,
            alert_remaining_ms: 0.0,
            since_bonus_ms: None,
            pending_increase: None,
            depleted: health.is_depleted(),
        }
    }

    fn reset(&mut self) {
        self.health = MentalHealth::FULL;
        self.accumulator_ms = 0.0;
        self.alert_remaining_ms = 0.0;
        self.since_bonus_ms = None;
        self.pending_increase = None;
        self.depleted = false;
    }

    fn take_bonus(&mut self) -> Option<f32> {
        let requested = self.pending_increase.take();
        let cooled_down = self
            .since_bonus_ms
            .is_none_or(|t| t >= self.config.bonus_cooldown_ms);
        if !cooled_down {
            if requested.is_some() {
                debug!("bonus request dropped during cooldown");
            }
            return None;
        }

        let from_sound = sound_bonus_amount(self.sound, self.threshold, self.config.bonus_scale);
        let amount = requested.unwrap_or(0.0).max(from_sound);
        if amount <= 0.0 {
            return None;
        }
        self.since_bonus_ms = Some(0.0);
        Some(amount.min(self.config.bonus_cap))
    }

    /// Run one tick. Returns the new health and whether this tick depleted it.
    fn step(&mut self) -> (MentalHealth, bool) {
        self.tick += 1;
        if let Some(t) = self.since_bonus_ms.as_mut() {
            *t += self.config.tick_ms;
        }

        let inputs = TickInputs {
            base_decay: self.config.base_decay,
            alert_multiplier: self.config.alert_multiplier,
            alert_active: self.alert_remaining_ms > 0.0,
            bonus: self.take_bonus(),
        };
        self.health = evaluate(self.health, &inputs);
        self.alert_remaining_ms = (self.alert_remaining_ms - self.config.tick_ms).max(0.0);

        let ended = self.health.is_depleted() && !self.depleted;
        if ended {
            self.depleted = true;
            self.accumulator_ms = 0.0;
        }
        (self.health, ended)
    }
}

/// Fixed-tick owner of [`MentalHealth`].
pub struct MentalHealthTimer {
    bus: EventBus,
    state: Rc<RefCell<TimerState>>,
    subscriptions: SmallVec<[Subscription; 5]>,
}

impl MentalHealthTimer {
    /// Create a timer at full health and subscribe its input handlers.
    pub fn new(bus: &EventBus, config: TimerConfig, threshold: SoundThreshold) -> Self {
        Self::with_health(bus, config, threshold, MentalHealth::FULL)
    }

    /// Like [`MentalHealthTimer::new`] with a custom starting value.
    pub fn with_health(
        bus: &EventBus,
        mut config: TimerConfig,
        threshold: SoundThreshold,
        health: MentalHealth,
    ) -> Self {
        if config.tick_ms.is_nan() || config.tick_ms <= 0.0 {
            warn!("timer tick_ms must be positive, using default");
            config.tick_ms = TimerConfig::default().tick_ms;
        }
        let state = Rc::new(RefCell::new(TimerState::new(config, health, threshold)));
        let mut subscriptions = SmallVec::new();

        let s = state.clone();
        subscriptions.push(bus.subscribe(move |_: &EnemyNear| {
            let mut s = s.try_borrow_mut().map_err(|_| HandlerError::Busy)?;
            if !s.depleted {
                s.alert_remaining_ms = s.config.alert_duration_ms;
            }
            Ok(())
        }));

        let s = state.clone();
        subscriptions.push(bus.subscribe(move |e: &IncreaseTimer| {
            let mut s = s.try_borrow_mut().map_err(|_| HandlerError::Busy)?;
            let amount = e.0;
            if s.depleted || !amount.is_finite() || amount <= 0.0 {
                debug!("ignoring increase-timer request of {amount}");
                return Ok(());
            }
            s.pending_increase = Some(s.pending_increase.map_or(amount, |p| p.max(amount)));
            Ok(())
        }));

        let s = state.clone();
        subscriptions.push(bus.subscribe(move |e: &SoundLevelChanged| {
            s.try_borrow_mut().map_err(|_| HandlerError::Busy)?.sound = e.0;
            Ok(())
        }));

        let s = state.clone();
        subscriptions.push(bus.subscribe(move |e: &SoundThresholdChanged| {
            s.try_borrow_mut().map_err(|_| HandlerError::Busy)?.threshold = e.0;
            Ok(())
        }));

        let s = state.clone();
        let weak = bus.downgrade();
        subscriptions.push(bus.subscribe(move |_: &ResetTimer| {
            s.try_borrow_mut().map_err(|_| HandlerError::Busy)?.reset();
            info!("Mental health reset");
            weak.publish(TimerUpdate(MentalHealth::FULL));
            Ok(())
        }));

        Self {
            bus: bus.clone(),
            state,
            subscriptions,
        }
    }

    /// Advance wall time by `dt` seconds and run every whole tick that fits.
    ///
    /// Returns the number of ticks run.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        let tick_ms = {
            let mut s = self.state.borrow_mut();
            if s.depleted {
                return 0;
            }
            s.accumulator_ms += dt * 1000.0;
            s.config.tick_ms
        };

        let mut ran = 0;
        loop {
            {
                let mut s = self.state.borrow_mut();
                if s.depleted || s.accumulator_ms < tick_ms {
                    break;
                }
                if ran >= MAX_CATCH_UP_TICKS {
                    warn!(
                        "mental health timer fell behind, dropping {:.0}ms",
                        s.accumulator_ms
                    );
                    s.accumulator_ms = 0.0;
                    break;
                }
                s.accumulator_ms -= tick_ms;
            }
            self.tick();
            ran += 1;
        }
        ran
    }

    /// Run exactly one tick now, unless the timer is halted.
    pub fn tick(&mut self) {
        let (health, ended) = {
            let mut s = self.state.borrow_mut();
            if s.depleted {
                return;
            }
            s.step()
        };
        self.bus.publish(TimerUpdate(health));
        if ended {
            info!("Mental health depleted");
            self.bus.publish(TimerEnded);
        }
    }

    pub fn health(&self) -> MentalHealth {
        self.state.borrow().health
    }

    pub fn is_depleted(&self) -> bool {
        self.state.borrow().depleted
    }

    pub fn alert_active(&self) -> bool {
        self.state.borrow().alert_remaining_ms > 0.0
    }

    /// Ticks run since creation.
    pub fn tick_count(&self) -> u64 {
        self.state.borrow().tick
    }

    /// Unsubscribe every handler. The timer keeps its value but no longer
    /// reacts to events.
    pub fn detach(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.bus.unsubscribe(subscription);
        }
    }
}

impl Drop for MentalHealthTimer {
    fn drop(&mut self) {
        self.detach();
    }
}
