//! Game simulation: arena layouts, physics, the per-client engine, the
//! solo-mode AI, and networked-state synchronization.

pub mod ai;
pub mod arena;
pub mod engine;
pub mod physics;
pub mod powerup;
pub mod sync;
pub mod tuning;
