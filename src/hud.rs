//! Render-agnostic HUD model.
//!
//! [`Hud`] listens to the bus and keeps the handful of values a HUD draws:
//! sound meter, microphone status, threshold, mental health bar, vision
//! circle, key count and the enemy alert marker. A renderer reads these
//! accessors each frame; nothing here draws.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::events::bus::{EventBus, HandlerError, Subscription};
use crate::events::gamestate::{CurrentSceneReady, KeyCollected};
use crate::events::sound::{MicStatus, MicStatusChanged, SoundLevelChanged, SoundThresholdChanged};
use crate::events::timer::{EnemyNear, TimerUpdate};
use crate::resources::gameconfig::GameConfig;
use crate::resources::mentalhealth::MentalHealth;
use crate::resources::sound::{SoundLevel, SoundThreshold};
use crate::visibility::Visibility;

/// Colour band of the mental health bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTier {
    /// Above 60.
    Healthy,
    /// Above 30.
    Strained,
    Critical,
}

impl TimerTier {
    pub fn for_health(health: MentalHealth) -> Self {
        match health.value() {
            v if v > 60.0 => TimerTier::Healthy,
            v if v > 30.0 => TimerTier::Strained,
            _ => TimerTier::Critical,
        }
    }
}

#[derive(Debug, Default)]
struct HudModel {
    sound: SoundLevel,
    status: MicStatus,
    threshold: SoundThreshold,
    health: MentalHealth,
    keys_held: u32,
    keys_required: u32,
    last_alert_tick: Option<u64>,
}

pub struct Hud {
    bus: EventBus,
    meter_full_scale: f32,
    model: Rc<RefCell<HudModel>>,
    visibility: Visibility,
    subscriptions: SmallVec<[Subscription; 7]>,
}

impl Hud {
    pub fn attach(bus: &EventBus, config: &GameConfig) -> Self {
        let model = Rc::new(RefCell::new(HudModel {
            threshold: config.sound.threshold,
            ..Default::default()
        }));
        let mut subscriptions = SmallVec::new();

        let m = model.clone();
        subscriptions.push(bus.subscribe(move |e: &SoundLevelChanged| {
            m.try_borrow_mut().map_err(|_| HandlerError::Busy)?.sound = e.0;
            Ok(())
        }));
        let m = model.clone();
        subscriptions.push(bus.subscribe(move |e: &MicStatusChanged| {
            m.try_borrow_mut().map_err(|_| HandlerError::Busy)?.status = e.0.clone();
            Ok(())
        }));
        let m = model.clone();
        subscriptions.push(bus.subscribe(move |e: &SoundThresholdChanged| {
            m.try_borrow_mut().map_err(|_| HandlerError::Busy)?.threshold = e.0;
            Ok(())
        }));
        let m = model.clone();
        subscriptions.push(bus.subscribe(move |e: &TimerUpdate| {
            m.try_borrow_mut().map_err(|_| HandlerError::Busy)?.health = e.0;
            Ok(())
        }));
        let m = model.clone();
        subscriptions.push(bus.subscribe(move |e: &EnemyNear| {
            m.try_borrow_mut().map_err(|_| HandlerError::Busy)?.last_alert_tick = Some(e.tick);
            Ok(())
        }));
        let m = model.clone();
        subscriptions.push(bus.subscribe(move |e: &KeyCollected| {
            let mut m = m.try_borrow_mut().map_err(|_| HandlerError::Busy)?;
            m.keys_held = e.held;
            m.keys_required = e.required;
            Ok(())
        }));
        let m = model.clone();
        subscriptions.push(bus.subscribe(move |e: &CurrentSceneReady| {
            let mut m = m.try_borrow_mut().map_err(|_| HandlerError::Busy)?;
            m.keys_held = 0;
            m.keys_required = e.required_keys;
            m.last_alert_tick = None;
            Ok(())
        }));

        Self {
            bus: bus.clone(),
            meter_full_scale: config.sound.meter_full_scale,
            model,
            visibility: Visibility::attach(bus, config.vision),
            subscriptions,
        }
    }

    /// Sound meter fill in `[0, 1]`.
    pub fn meter_fill(&self) -> f32 {
        if self.meter_full_scale <= 0.0 {
            return 1.0;
        }
        (self.model.borrow().sound.value() / self.meter_full_scale).min(1.0)
    }

    pub fn sound_level(&self) -> SoundLevel {
        self.model.borrow().sound
    }

    pub fn status_line(&self) -> String {
        format!("Microphone: {}", self.model.borrow().status)
    }

    pub fn threshold(&self) -> SoundThreshold {
        self.model.borrow().threshold
    }

    pub fn health(&self) -> MentalHealth {
        self.model.borrow().health
    }

    pub fn timer_tier(&self) -> TimerTier {
        TimerTier::for_health(self.health())
    }

    pub fn vision_radius(&self) -> f32 {
        self.visibility.radius()
    }

    pub fn halo_radius(&self) -> f32 {
        self.visibility.halo_radius()
    }

    /// `(held, required)`; `(0, 0)` until the first key is collected.
    pub fn keys(&self) -> (u32, u32) {
        let m = self.model.borrow();
        (m.keys_held, m.keys_required)
    }

    /// Tick marker of the latest enemy alert seen.
    pub fn last_alert_tick(&self) -> Option<u64> {
        self.model.borrow().last_alert_tick
    }

    pub fn detach(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.bus.unsubscribe(subscription);
        }
        self.visibility.detach();
    }
}

impl Drop for Hud {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_tier_bands() {
        assert_eq!(TimerTier::for_health(MentalHealth::FULL), TimerTier::Healthy);
        assert_eq!(TimerTier::for_health(MentalHealth::new(60.0)), TimerTier::Strained);
        assert_eq!(TimerTier::for_health(MentalHealth::new(30.5)), TimerTier::Strained);
        assert_eq!(TimerTier::for_health(MentalHealth::new(30.0)), TimerTier::Critical);
        assert_eq!(TimerTier::for_health(MentalHealth::EMPTY), TimerTier::Critical);
    }

    #[test]
    fn test_hud_mirrors_bus_events() {
        let bus = EventBus::new();
        let hud = Hud::attach(&bus, &GameConfig::new());
        assert_eq!(hud.status_line(), "Microphone: Requesting access...");

        bus.publish(SoundLevelChanged(SoundLevel::new(64.0)));
        bus.publish(MicStatusChanged(MicStatus::Active));
        bus.publish(SoundThresholdChanged(SoundThreshold::new(90.0)));
        bus.publish(TimerUpdate(MentalHealth::new(40.0)));
        bus.publish(EnemyNear { tick: 7 });
        bus.publish(KeyCollected { held: 1, required: 2 });

        assert_eq!(hud.meter_fill(), 0.5);
        assert_eq!(hud.status_line(), "Microphone: Active");
        assert_eq!(hud.threshold(), SoundThreshold::new(90.0));
        assert_eq!(hud.timer_tier(), TimerTier::Strained);
        assert_eq!(hud.vision_radius(), 60.0);
        assert_eq!(hud.last_alert_tick(), Some(7));
        assert_eq!(hud.keys(), (1, 2));
    }

    #[test]
    fn test_new_level_resets_key_count() {
        let bus = EventBus::new();
        let hud = Hud::attach(&bus, &GameConfig::new());
        bus.publish(CurrentSceneReady {
            level: "level1".to_string(),
            required_keys: 1,
        });
        assert_eq!(hud.keys(), (0, 1));
        bus.publish(KeyCollected { held: 1, required: 1 });
        bus.publish(EnemyNear { tick: 3 });
        assert_eq!(hud.keys(), (1, 1));

        bus.publish(CurrentSceneReady {
            level: "level2".to_string(),
            required_keys: 2,
        });
        assert_eq!(hud.keys(), (0, 2));
        assert_eq!(hud.last_alert_tick(), None);
    }

    #[test]
    fn test_meter_fill_saturates() {
        let bus = EventBus::new();
        let hud = Hud::attach(&bus, &GameConfig::new());
        bus.publish(SoundLevelChanged(SoundLevel::new(255.0)));
        assert_eq!(hud.meter_fill(), 1.0);
    }

    #[test]
    fn test_detach_removes_every_handler() {
        let bus = EventBus::new();
        let mut hud = Hud::attach(&bus, &GameConfig::new());
        assert_eq!(bus.total_listeners(), 8);
        hud.detach();
        assert_eq!(bus.total_listeners(), 0);
    }
}
