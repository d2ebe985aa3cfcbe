//! Sound-driven enemy behaviour.
//!
//! Every enemy has an [`EnemyKind`] that decides, each tick, whether the
//! current [`SoundLevel`] wakes it up and how fast it then walks towards its
//! target:
//!
//! | kind             | active when          | speed                                   |
//! |------------------|----------------------|-----------------------------------------|
//! | `SoundSeeking`   | level > threshold    | `base · min(level / k, cap)`            |
//! | `SilenceSeeking` | level ≤ threshold    | `base · min((threshold − level) / k, cap)` |
//! | `PassivePursuer` | always               | `passive_speed`                         |
//!
//! An inactive enemy stands still.
//!
//! The threshold is not read from a global. Each enemy subscribes to
//! [`SoundThresholdChanged`] when it is spawned; the bus handler forwards the
//! new value through a channel that [`Enemy::update_tick`] drains, so a
//! change applies on the next tick without recreating the enemy. Call
//! [`Enemy::destroy`] before the enemy is despawned to unsubscribe it.

use bevy_ecs::prelude::{Component, Entity};
use crossbeam_channel::{Receiver, unbounded};
use glam::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::events::bus::{EventBus, HandlerError, Subscription};
use crate::events::sound::SoundThresholdChanged;
use crate::resources::gameconfig::EnemyConfig;
use crate::resources::sound::{SoundLevel, SoundThreshold};

/// Behaviour variant, fixed at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Wakes up when the player is loud.
    SoundSeeking,
    /// Wakes up when the player is quiet.
    SilenceSeeking,
    /// Ignores sound and always follows.
    PassivePursuer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Inactive,
    Active,
}

/// Horizontal facing for the walk animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Whether an enemy of `kind` reacts to `level` under `threshold`.
pub fn activation_for(kind: EnemyKind, level: SoundLevel, threshold: SoundThreshold) -> Activation {
    let active = match kind {
        EnemyKind::SoundSeeking => threshold.is_exceeded_by(level),
        EnemyKind::SilenceSeeking => !threshold.is_exceeded_by(level),
        EnemyKind::PassivePursuer => true,
    };
    if active {
        Activation::Active
    } else {
        Activation::Inactive
    }
}

/// Pursuit speed in units per second; zero while inactive.
pub fn pursuit_speed(
    kind: EnemyKind,
    level: SoundLevel,
    threshold: SoundThreshold,
    tuning: &EnemyConfig,
) -> f32 {
    if activation_for(kind, level, threshold) == Activation::Inactive {
        return 0.0;
    }
    let multiplier = |drive: f32| {
        if tuning.speed_divisor > 0.0 {
            (drive / tuning.speed_divisor).min(tuning.speed_cap).max(0.0)
        } else {
            tuning.speed_cap.max(0.0)
        }
    };
    match kind {
        EnemyKind::SoundSeeking => tuning.base_speed * multiplier(level.value()),
        EnemyKind::SilenceSeeking => {
            tuning.base_speed * multiplier(threshold.value() - level.value())
        }
        EnemyKind::PassivePursuer => tuning.passive_speed,
    }
}

/// Behaviour state of one enemy.
#[derive(Component, Debug)]
pub struct Enemy {
    kind: EnemyKind,
    target: Entity,
    threshold: SoundThreshold,
    tuning: EnemyConfig,
    activation: Activation,
    facing: Facing,
    last_distance: f32,
    inbox: Receiver<SoundThreshold>,
    subscription: Option<Subscription>,
}

impl Enemy {
    /// Create an enemy pursuing `target` and subscribe it to threshold changes.
    pub fn spawn(
        kind: EnemyKind,
        target: Entity,
        threshold: SoundThreshold,
        tuning: EnemyConfig,
        bus: &EventBus,
    ) -> Self {
        let (tx, inbox) = unbounded();
        let subscription = bus.subscribe(move |e: &SoundThresholdChanged| {
            tx.send(e.0).map_err(|_| HandlerError::Stale)
        });
        debug!("Spawned {kind:?} enemy");
        Self {
            kind,
            target,
            threshold,
            tuning,
            activation: Activation::Inactive,
            facing: Facing::default(),
            last_distance: f32::INFINITY,
            inbox,
            subscription: Some(subscription),
        }
    }

    /// Run one behaviour step and return the velocity the enemy wants.
    ///
    /// Also records the distance to `target` for proximity checks. Returns
    /// zero once the enemy has been destroyed.
    pub fn update_tick(&mut self, sound: SoundLevel, position: Vec2, target: Vec2) -> Vec2 {
        if self.is_destroyed() {
            return Vec2::ZERO;
        }
        while let Ok(threshold) = self.inbox.try_recv() {
            self.threshold = threshold;
        }

        self.last_distance = position.distance(target);
        self.activation = activation_for(self.kind, sound, self.threshold);
        let speed = pursuit_speed(self.kind, sound, self.threshold, &self.tuning);
        let velocity = (target - position).normalize_or_zero() * speed;

        if velocity.x < 0.0 {
            self.facing = Facing::Left;
        } else if velocity.x > 0.0 {
            self.facing = Facing::Right;
        }
        velocity
    }

    /// Distance to the target measured by the latest [`Enemy::update_tick`].
    pub fn distance_to_target(&self) -> f32 {
        self.last_distance
    }

    /// Unsubscribe from the bus and stop reacting. Safe to call twice.
    pub fn destroy(&mut self, bus: &EventBus) {
        if let Some(subscription) = self.subscription.take() {
            bus.unsubscribe(subscription);
            self.activation = Activation::Inactive;
            debug!("Destroyed {:?} enemy", self.kind);
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.subscription.is_none()
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn target(&self) -> Entity {
        self.target
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Threshold this enemy last applied.
    pub fn threshold(&self) -> SoundThreshold {
        self.threshold
    }
}
