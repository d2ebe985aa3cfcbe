//! Ambient sound sampling.
//!
//! The [`SignalSampler`] turns raw frequency-magnitude blocks into one
//! [`SoundLevel`] per block and publishes it as [`SoundLevelChanged`]. It is
//! driven on the audio cadence, independently of game frames and timer ticks,
//! either by pushing blocks into [`SignalSampler::on_audio_block`] or by
//! pulling the newest block from an [`AudioSource`] with
//! [`SignalSampler::poll`].
//!
//! When the source fails, nothing is published and consumers keep the last
//! level they saw. The microphone status is reported through
//! [`MicStatusChanged`], once per change.

use log::{debug, info, warn};
use thiserror::Error;

use crate::events::bus::EventBus;
use crate::events::sound::{MicStatus, MicStatusChanged, SoundLevelChanged};
use crate::resources::capture::AudioBlock;
use crate::resources::sound::SoundLevel;

/// Why no audio block is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("no capture device available")]
    NoDevice,
    #[error("microphone access denied: {0}")]
    Denied(String),
    #[error("capture stream disconnected")]
    Disconnected,
}

/// Anything that can hand over the newest captured block.
pub trait AudioSource {
    /// `Ok(None)` when no new block arrived since the last call.
    fn latest_block(&mut self) -> Result<Option<AudioBlock>, SignalError>;
}

/// Source used when the platform has no microphone at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

impl AudioSource for NoCapture {
    fn latest_block(&mut self) -> Result<Option<AudioBlock>, SignalError> {
        Err(SignalError::NoDevice)
    }
}

/// Mean magnitude of the first `bin_count` bins.
///
/// Shorter blocks average what they have; an empty block yields `None`.
pub fn mean_low_bins(block: &[u8], bin_count: usize) -> Option<SoundLevel> {
    let bins = &block[..block.len().min(bin_count.max(1))];
    if bins.is_empty() {
        return None;
    }
    let sum: u32 = bins.iter().map(|&b| u32::from(b)).sum();
    Some(SoundLevel::new(sum as f32 / bins.len() as f32))
}

/// Converts capture blocks into sound-level events.
pub struct SignalSampler {
    bus: EventBus,
    bin_count: usize,
    status: MicStatus,
    last_level: Option<SoundLevel>,
}

impl SignalSampler {
    /// Create a sampler and announce that microphone access is being requested.
    pub fn new(bus: &EventBus, bin_count: usize) -> Self {
        bus.publish(MicStatusChanged(MicStatus::Requesting));
        Self {
            bus: bus.clone(),
            bin_count: bin_count.max(1),
            status: MicStatus::Requesting,
            last_level: None,
        }
    }

    /// Process one block and publish its level.
    ///
    /// Returns the published level, or `None` for an empty block.
    pub fn on_audio_block(&mut self, block: &[u8]) -> Option<SoundLevel> {
        self.set_status(MicStatus::Active);
        let level = mean_low_bins(block, self.bin_count)?;
        self.last_level = Some(level);
        self.bus.publish(SoundLevelChanged(level));
        Some(level)
    }

    /// Pull the newest block from `source` and process it.
    pub fn poll(&mut self, source: &mut impl AudioSource) -> Option<SoundLevel> {
        match source.latest_block() {
            Ok(Some(block)) => self.on_audio_block(&block),
            Ok(None) => None,
            Err(e) => {
                let status = MicStatus::Unavailable(e.to_string());
                if self.status != status {
                    warn!("Sound signal unavailable: {e}");
                }
                self.set_status(status);
                None
            }
        }
    }

    pub fn status(&self) -> &MicStatus {
        &self.status
    }

    /// Last level published, if any.
    pub fn last_level(&self) -> Option<SoundLevel> {
        self.last_level
    }

    fn set_status(&mut self, status: MicStatus) {
        if self.status == status {
            return;
        }
        if status == MicStatus::Active {
            info!("Microphone active");
        } else {
            debug!("Microphone status: {status}");
        }
        self.status = status.clone();
        self.bus.publish(MicStatusChanged(status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    struct Scripted(VecDeque<Result<Option<AudioBlock>, SignalError>>);

    impl AudioSource for Scripted {
        fn latest_block(&mut self) -> Result<Option<AudioBlock>, SignalError> {
            self.0.pop_front().unwrap_or(Ok(None))
        }
    }

    fn record<E: crate::events::bus::BusEvent + Clone>(bus: &EventBus) -> Rc<RefCell<Vec<E>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(move |e: &E| {
            sink.borrow_mut().push(e.clone());
            Ok(())
        });
        seen
    }

    #[test]
    fn test_mean_low_bins_uses_first_bins_only() {
        let mut block = vec![100u8; 50];
        block.extend(vec![255u8; 50]);
        assert_eq!(mean_low_bins(&block, 50), Some(SoundLevel::new(100.0)));
    }

    #[test]
    fn test_mean_low_bins_short_and_empty_blocks() {
        assert_eq!(mean_low_bins(&[10, 20, 30], 50), Some(SoundLevel::new(20.0)));
        assert_eq!(mean_low_bins(&[], 50), None);
    }

    #[test]
    fn test_block_publishes_level() {
        let bus = EventBus::new();
        let levels = record::<SoundLevelChanged>(&bus);
        let mut sampler = SignalSampler::new(&bus, 4);

        assert_eq!(sampler.on_audio_block(&[40, 80, 120, 160, 255]), Some(SoundLevel::new(100.0)));
        assert_eq!(sampler.on_audio_block(&[]), None);

        assert_eq!(*levels.borrow(), vec![SoundLevelChanged(SoundLevel::new(100.0))]);
        assert_eq!(sampler.last_level(), Some(SoundLevel::new(100.0)));
    }

    #[test]
    fn test_failure_freezes_level_and_reports_status_once() {
        let bus = EventBus::new();
        let statuses = record::<MicStatusChanged>(&bus);
        let levels = record::<SoundLevelChanged>(&bus);
        let mut sampler = SignalSampler::new(&bus, 50);
        let mut source = Scripted(VecDeque::from(vec![
            Ok(Some(vec![70; 50])),
            Err(SignalError::Disconnected),
            Err(SignalError::Disconnected),
            Ok(None),
            Ok(Some(vec![90; 50])),
        ]));

        for _ in 0..5 {
            sampler.poll(&mut source);
        }

        let disconnected = MicStatus::Unavailable(SignalError::Disconnected.to_string());
        assert_eq!(
            *statuses.borrow(),
            vec![
                MicStatusChanged(MicStatus::Requesting),
                MicStatusChanged(MicStatus::Active),
                MicStatusChanged(disconnected),
                MicStatusChanged(MicStatus::Active),
            ]
        );
        assert_eq!(levels.borrow().len(), 2);
        assert_eq!(sampler.status(), &MicStatus::Active);
    }

    #[test]
    fn test_no_capture_reports_unavailable() {
        let bus = EventBus::new();
        let mut sampler = SignalSampler::new(&bus, 50);
        assert_eq!(sampler.poll(&mut NoCapture), None);
        assert_eq!(sampler.status().to_string(), "Error: no capture device available");
        assert_eq!(sampler.last_level(), None);
    }
}
