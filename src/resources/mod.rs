//! Shared data: value types, configuration and ECS resources.
//!
//! This module groups the long-lived data used across the core: clamped value
//! types, the configuration loaded at startup, level layouts, the capture
//! bridge, and the resources injected into a level's ECS world. Each
//! submodule documents the semantics and intended usage of its types.
//!
//! Overview
//! - `capture` – background capture thread and the channel the sampler reads
//! - `gameconfig` – INI-backed tunables for every component
//! - `leveldata` – level layouts, validation and layout sources
//! - `levelstate` – per-tick reports written by level systems
//! - `mentalhealth` – the clamped survival resource value
//! - `sound` – clamped sound level and threshold values
//! - `worldtime` – simulation time and delta
pub mod capture;
pub mod gameconfig;
pub mod leveldata;
pub mod levelstate;
pub mod mentalhealth;
pub mod sound;
pub mod worldtime;
