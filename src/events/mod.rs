//! Event types and the bus that carries them.
//!
//! This module groups the domain events exchanged across components and the
//! [`bus::EventBus`] that delivers them. Components never hold references to
//! each other; they publish and subscribe to these typed events instead.
//!
//! Submodules:
//! - [`bus`] – synchronous, typed publish/subscribe channel
//! - [`sound`] – sound level, threshold and microphone status notifications
//! - [`timer`] – mental health updates, depletion, bonus and reset requests
//! - [`gamestate`] – level flow and lifecycle markers for UI collaborators
//!
//! Every event implements [`bus::BusEvent`], which carries the stable wire
//! name used in logs (e.g. `"sound-level"`).
pub mod bus;
pub mod gamestate;
pub mod sound;
pub mod timer;
