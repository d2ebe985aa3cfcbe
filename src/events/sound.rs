//! Sound signal events.
//!
//! Published by the [`SignalSampler`](crate::sampler::SignalSampler) and the
//! settings flow in [`Game`](crate::game::Game); consumed by the mental health
//! timer, enemies, the level controller and the HUD.

use std::fmt;

use crate::events::bus::BusEvent;
use crate::resources::sound::{SoundLevel, SoundThreshold};

/// Latest sampled ambient loudness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundLevelChanged(pub SoundLevel);

impl BusEvent for SoundLevelChanged {
    const NAME: &'static str = "sound-level";
}

/// The loud/quiet boundary was changed by the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundThresholdChanged(pub SoundThreshold);

impl BusEvent for SoundThresholdChanged {
    const NAME: &'static str = "sound-threshold-change";
}

/// State of the capture device as seen by the sampler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MicStatus {
    /// Waiting for the first block from the capture source.
    #[default]
    Requesting,
    /// Blocks are arriving.
    Active,
    /// The source is missing or refused; the last sound level is frozen.
    Unavailable(String),
}

impl fmt::Display for MicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MicStatus::Requesting => write!(f, "Requesting access..."),
            MicStatus::Active => write!(f, "Active"),
            MicStatus::Unavailable(reason) => write!(f, "Error: {reason}"),
        }
    }
}

/// Capture status changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicStatusChanged(pub MicStatus);

impl BusEvent for MicStatusChanged {
    const NAME: &'static str = "mic-status";
}
