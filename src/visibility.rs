//! Vision radius derived from mental health.
//!
//! The visible circle around the player shrinks with mental health. The
//! radius is never stored on its own: [`Visibility`] only mirrors the latest
//! [`TimerUpdate`] and computes the radius on demand.

use std::cell::Cell;
use std::rc::Rc;

use crate::events::bus::{EventBus, Subscription};
use crate::events::timer::TimerUpdate;
use crate::resources::gameconfig::VisionConfig;
use crate::resources::mentalhealth::MentalHealth;

/// `base` scaled by the health fraction. Equals `base` at full health and
/// zero when depleted.
pub fn vision_radius(base: f32, health: MentalHealth) -> f32 {
    base.max(0.0) * health.fraction()
}

/// Read-only view of the player's vision circle.
pub struct Visibility {
    bus: EventBus,
    config: VisionConfig,
    health: Rc<Cell<MentalHealth>>,
    subscription: Option<Subscription>,
}

impl Visibility {
    /// Start mirroring mental health, assuming full health until the first
    /// update arrives.
    pub fn attach(bus: &EventBus, config: VisionConfig) -> Self {
        let health = Rc::new(Cell::new(MentalHealth::FULL));
        let sink = health.clone();
        let subscription = bus.subscribe(move |e: &TimerUpdate| {
            sink.set(e.0);
            Ok(())
        });
        Self {
            bus: bus.clone(),
            config,
            health,
            subscription: Some(subscription),
        }
    }

    pub fn radius(&self) -> f32 {
        vision_radius(self.config.base_radius, self.health.get())
    }

    /// Outer edge of the soft ring drawn around the vision circle.
    pub fn halo_radius(&self) -> f32 {
        self.radius() + self.config.halo_width.max(0.0)
    }

    pub fn health(&self) -> MentalHealth {
        self.health.get()
    }

    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.bus.unsubscribe(subscription);
        }
    }
}

impl Drop for Visibility {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_radius_is_monotonic() {
        let mut previous = 0.0;
        for step in 0..=100 {
            let radius = vision_radius(150.0, MentalHealth::new(step as f32));
            assert!(radius >= previous);
            previous = radius;
        }
        assert_eq!(vision_radius(150.0, MentalHealth::FULL), 150.0);
        assert_eq!(vision_radius(150.0, MentalHealth::EMPTY), 0.0);
    }

    #[test]
    fn test_visibility_follows_timer_updates() {
        let bus = EventBus::new();
        let visibility = Visibility::attach(&bus, VisionConfig::default());
        assert_eq!(visibility.radius(), 150.0);

        bus.publish(TimerUpdate(MentalHealth::new(50.0)));
        assert_eq!(visibility.radius(), 75.0);
        assert_eq!(visibility.halo_radius(), 95.0);
    }

    #[test]
    fn test_detach_stops_mirroring() {
        let bus = EventBus::new();
        let mut visibility = Visibility::attach(&bus, VisionConfig::default());
        visibility.detach();
        bus.publish(TimerUpdate(MentalHealth::new(10.0)));
        assert_eq!(visibility.health(), MentalHealth::FULL);
        assert_eq!(bus.total_listeners(), 0);
    }
}
