//! Hushbound gameplay core.
//!
//! This crate exposes the reactive survival core of a top-down stealth game:
//! an ambient sound signal drives enemy behaviour and a decaying mental health
//! resource that shrinks the player's vision. Rendering, audio capture and
//! asset loading are left to the embedding application; everything here is
//! headless and driven by explicit tick calls.
//!
//! Components talk to each other only through the typed
//! [`EventBus`](events::bus::EventBus) handed to their constructors.

pub mod components;
pub mod events;
pub mod game;
pub mod hud;
pub mod level;
pub mod mentaltimer;
pub mod resources;
pub mod sampler;
pub mod systems;
pub mod visibility;
