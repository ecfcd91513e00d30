//! Run state and core simulation types
//!
//! Everything a single run needs to stay deterministic lives here.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Car on the road, score ticking
    Running,
    /// Hit an obstacle; score is final
    Crashed,
}

/// Weather rolled at the start of a run (cosmetic overlay)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weather {
    Clear,
    Rain,
}

/// Something the engine should create, falling from the top of the road
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Events produced by a tick, for the engine to act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    ObstacleSpawned(Spawn),
    PowerupSpawned(Spawn),
    /// Base difficulty stepped up
    DifficultyRaised { difficulty: f32 },
    /// A power-up started easing the difficulty
    PowerupCollected { difficulty: f32 },
    /// A power-up wore off
    PowerupExpired { difficulty: f32 },
    ChallengeCompleted { score: u64 },
    /// Run over; the engine submits this score
    Crashed { score: u64 },
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    /// Score (one point per tick survived)
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: RunPhase,
    pub weather: Weather,
    /// Difficulty from the score ramp, before power-up relief
    pub base_difficulty: f32,
    /// Remaining ticks of each active power-up
    pub powerup_ticks: Vec<u32>,
    /// Ticks until the next obstacle
    pub obstacle_timer: u32,
    /// Ticks until the next power-up
    pub powerup_timer: u32,
    pub challenge_complete: bool,
    /// Lateral velocity the engine should apply to the car
    pub player_vel_x: f32,
    /// Road texture scroll position
    pub road_offset: f32,
    next_id: u32,
}

impl RunState {
    /// Create a new run with the given seed
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let weather = if rng.random_bool(tuning.rain_chance.clamp(0.0, 1.0)) {
            Weather::Rain
        } else {
            Weather::Clear
        };

        Self {
            seed,
            rng,
            score: 0,
            time_ticks: 0,
            phase: RunPhase::Running,
            weather,
            base_difficulty: 1.0,
            powerup_ticks: Vec::new(),
            obstacle_timer: tuning.obstacle_interval_ticks(),
            powerup_timer: tuning.powerup_interval_ticks(),
            challenge_complete: false,
            player_vel_x: 0.0,
            road_offset: 0.0,
            next_id: 1,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Difficulty after power-up relief, never below the tuning floor
    pub fn difficulty(&self, tuning: &Tuning) -> f32 {
        let relief = tuning.powerup_relief * self.powerup_ticks.len() as f32;
        (self.base_difficulty - relief).max(tuning.min_difficulty)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Random x within the spawn band
    pub fn roll_spawn_x(&mut self, tuning: &Tuning) -> f32 {
        self.rng.random_range(tuning.spawn_x_min..=tuning.spawn_x_max)
    }
}
