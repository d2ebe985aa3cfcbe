//! Level systems.
//!
//! This module groups the ECS systems a [`LevelController`](crate::level::LevelController)
//! runs once per physics tick, in this order:
//! player control → enemy behaviour → movement → proximity → key pickup → door check.
//!
//! Submodules overview
//! - [`enemy`] – per-enemy activation and pursuit velocity
//! - [`movement`] – integrate positions from rigid body velocities and time
//! - [`pickup`] – key collection and door contact
//! - [`player`] – translate player intent into velocity
//! - [`proximity`] – count enemies inside the alert distance
//! - [`time`] – update simulation time and delta

pub mod enemy;
pub mod movement;
pub mod pickup;
pub mod player;
pub mod proximity;
pub mod time;
