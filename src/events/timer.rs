//! Mental health timer events.
//!
//! The [`MentalHealthTimer`](crate::mentaltimer::MentalHealthTimer) publishes
//! [`TimerUpdate`] after every executed tick and [`TimerEnded`] once when the
//! value first reaches zero. Everything else in this module is a request
//! addressed *to* the timer; only the timer mutates mental health.
//!
//! # Related
//!
//! - [`crate::resources::mentalhealth::MentalHealth`] – the payload value type
//! - [`crate::level::LevelController`] – publishes [`EnemyNear`] and [`ResetTimer`]

use crate::events::bus::BusEvent;
use crate::resources::mentalhealth::MentalHealth;

/// Current mental health after a timer tick or reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerUpdate(pub MentalHealth);

impl BusEvent for TimerUpdate {
    const NAME: &'static str = "timer-update";
}

/// Mental health reached zero. Fired once until the next [`ResetTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEnded;

impl BusEvent for TimerEnded {
    const NAME: &'static str = "timer-ended";
}

/// Request a bonus of the given amount, already net of threshold math.
///
/// The timer still applies its per-application cap and cooldown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncreaseTimer(pub f32);

impl BusEvent for IncreaseTimer {
    const NAME: &'static str = "increase-timer";
}

/// Restore mental health to full and clear every modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetTimer;

impl BusEvent for ResetTimer {
    const NAME: &'static str = "reset-timer";
}

/// At least one enemy was inside alert distance during this level tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyNear {
    /// Level tick on which the proximity was measured.
    pub tick: u64,
}

impl BusEvent for EnemyNear {
    const NAME: &'static str = "enemy-near";
}
