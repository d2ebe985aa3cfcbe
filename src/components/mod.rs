//! ECS components for level entities.
//!
//! This module groups the component types attached to entities in a level's
//! world. Components hold data; the systems in [`crate::systems`] act on them.
//!
//! Submodules overview:
//! - [`enemy`] – sound-driven pursuit behaviour and its bus subscription
//! - [`mapposition`] – world-space position (pivot) for an entity
//! - [`pickup`] – keys and doors the player touches
//! - [`player`] – the pursuit target and its movement intent
//! - [`rigidbody`] – simple kinematic body storing velocity

pub mod enemy;
pub mod mapposition;
pub mod pickup;
pub mod player;
pub mod rigidbody;
