//! Deterministic run simulation
//!
//! Scoring, difficulty and spawn timing for one run. This module must be
//! pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, physics or platform dependencies

pub mod state;
pub mod tick;

pub use state::{RunEvent, RunPhase, RunState, Spawn, Weather};
pub use tick::{Steer, TickInput, tick};
