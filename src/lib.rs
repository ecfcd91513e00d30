//! Road Rush - a lane-dodging arcade driver with an online leaderboard
//!
//! Core modules:
//! - `sim`: Deterministic run simulation (score, difficulty, spawns)
//! - `leaderboard`: Score records and top-K ranking
//! - `submission`: Saving a finished run's score
//! - `session`: Per-session identity and display name
//! - `service`: Submit/refresh flow between the game loop and the backend
//! - `persistence`: Score store backends
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod error;
pub mod identity;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod service;
pub mod session;
pub mod settings;
pub mod sim;
pub mod submission;
pub mod tuning;

pub use error::{Error, Result};
pub use identity::{AnonymousAuth, PlayerIdentity};
pub use leaderboard::{LeaderboardView, ScoreRecord, fetch_top};
pub use persistence::{MemoryStore, ScoreStore};
pub use service::{LeaderboardService, LeaderboardSink, LogSink, ScoreSink};
pub use session::{GUEST_NAME, Session, resolve_display_name};
pub use settings::Settings;
pub use submission::submit;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (one score point per tick)
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}
