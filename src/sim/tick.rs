//! Fixed timestep run tick
//!
//! Advances a run deterministically. Collisions are detected by the engine
//! and arrive here as input flags.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{RunEvent, RunPhase, RunState, Spawn};
use crate::tuning::Tuning;

/// Steering direction held this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Steer {
    #[default]
    None,
    Left,
    Right,
}

impl Steer {
    /// Map a -1/0/1 axis from the engine
    pub fn from_axis(axis: i32) -> Self {
        match axis.signum() {
            -1 => Steer::Left,
            1 => Steer::Right,
            _ => Steer::None,
        }
    }
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub steer: Steer,
    /// Car hit an obstacle this tick
    pub crashed: bool,
    /// Power-ups the car overlapped this tick
    pub powerups_collected: u32,
}

/// Advance the run by one fixed timestep
pub fn tick(state: &mut RunState, input: &TickInput, tuning: &Tuning) -> Vec<RunEvent> {
    let mut events = Vec::new();

    if state.phase == RunPhase::Crashed {
        return events;
    }

    if input.crashed {
        state.phase = RunPhase::Crashed;
        state.player_vel_x = 0.0;
        log::debug!("Run {} crashed at {}", state.seed, state.score);
        events.push(RunEvent::Crashed { score: state.score });
        return events;
    }

    state.player_vel_x = match input.steer {
        Steer::Left => -tuning.steer_speed,
        Steer::Right => tuning.steer_speed,
        Steer::None => 0.0,
    };

    // Tick down active power-ups before adding this tick's pickups
    let before = state.powerup_ticks.len();
    state.powerup_ticks.iter_mut().for_each(|t| *t = t.saturating_sub(1));
    state.powerup_ticks.retain(|&t| t > 0);
    for _ in state.powerup_ticks.len()..before {
        events.push(RunEvent::PowerupExpired {
            difficulty: state.difficulty(tuning),
        });
    }

    for _ in 0..input.powerups_collected {
        state.powerup_ticks.push(tuning.powerup_duration_ticks());
        events.push(RunEvent::PowerupCollected {
            difficulty: state.difficulty(tuning),
        });
    }

    state.score += 1;
    state.time_ticks += 1;

    if state.score % tuning.difficulty_interval == 0 {
        state.base_difficulty += tuning.difficulty_step;
        events.push(RunEvent::DifficultyRaised {
            difficulty: state.difficulty(tuning),
        });
    }

    if !state.challenge_complete && state.score >= tuning.challenge_goal {
        state.challenge_complete = true;
        events.push(RunEvent::ChallengeCompleted { score: state.score });
    }

    let difficulty = state.difficulty(tuning);
    state.road_offset += tuning.road_scroll_speed * difficulty;

    state.obstacle_timer = state.obstacle_timer.saturating_sub(1);
    if state.obstacle_timer == 0 {
        state.obstacle_timer = tuning.obstacle_interval_ticks();
        let x = state.roll_spawn_x(tuning);
        events.push(RunEvent::ObstacleSpawned(Spawn {
            id: state.next_entity_id(),
            pos: Vec2::new(x, 0.0),
            vel: Vec2::new(0.0, tuning.obstacle_speed * difficulty),
        }));
    }

    state.powerup_timer = state.powerup_timer.saturating_sub(1);
    if state.powerup_timer == 0 {
        state.powerup_timer = tuning.powerup_interval_ticks();
        let x = state.roll_spawn_x(tuning);
        events.push(RunEvent::PowerupSpawned(Spawn {
            id: state.next_entity_id(),
            pos: Vec2::new(x, 0.0),
            vel: Vec2::new(0.0, tuning.powerup_speed),
        }));
    }

    events
}
