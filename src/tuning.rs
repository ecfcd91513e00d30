//! Data-driven game balance
//!
//! Times are in seconds and converted to ticks at the fixed sim rate.

use serde::{Deserialize, Serialize};

use crate::consts::SIM_HZ;
use crate::error::{Error, Result};

/// Balance knobs for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seconds between obstacle spawns
    pub obstacle_interval_secs: f32,
    /// Seconds between power-up spawns
    pub powerup_interval_secs: f32,
    /// Horizontal spawn band (pixels)
    pub spawn_x_min: f32,
    pub spawn_x_max: f32,
    /// Obstacle fall speed at difficulty 1.0 (pixels/s)
    pub obstacle_speed: f32,
    /// Power-up fall speed (pixels/s, unaffected by difficulty)
    pub powerup_speed: f32,
    /// Lateral car speed while steering (pixels/s)
    pub steer_speed: f32,
    /// Road texture scroll per tick at difficulty 1.0
    pub road_scroll_speed: f32,
    /// Score interval between difficulty steps
    pub difficulty_interval: u64,
    /// Difficulty added per step
    pub difficulty_step: f32,
    /// Difficulty removed while a power-up is active
    pub powerup_relief: f32,
    /// How long a power-up lasts
    pub powerup_duration_secs: f32,
    /// Effective difficulty never drops below this
    pub min_difficulty: f32,
    /// Score that completes the run's challenge
    pub challenge_goal: u64,
    /// Chance a run starts in the rain
    pub rain_chance: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            obstacle_interval_secs: 2.0,
            powerup_interval_secs: 10.0,
            spawn_x_min: 300.0,
            spawn_x_max: 500.0,
            obstacle_speed: 200.0,
            powerup_speed: 150.0,
            steer_speed: 200.0,
            road_scroll_speed: 5.0,
            difficulty_interval: 500,
            difficulty_step: 0.2,
            powerup_relief: 0.5,
            powerup_duration_secs: 5.0,
            min_difficulty: 0.25,
            challenge_goal: 1000,
            rain_chance: 0.5,
        }
    }
}

/// Convert seconds to whole sim ticks (at least one)
pub fn secs_to_ticks(secs: f32) -> u32 {
    ((secs * SIM_HZ as f32).round() as u32).max(1)
}

impl Tuning {
    /// Parse tuning overrides from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<()> {
        if self.spawn_x_min > self.spawn_x_max {
            return Err(Error::Config("spawn_x_min exceeds spawn_x_max".into()));
        }
        if self.difficulty_interval == 0 {
            return Err(Error::Config("difficulty_interval must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.rain_chance) {
            return Err(Error::Config("rain_chance must be within 0..=1".into()));
        }
        if self.obstacle_interval_secs <= 0.0 || self.powerup_interval_secs <= 0.0 {
            return Err(Error::Config("spawn intervals must be positive".into()));
        }
        Ok(())
    }

    pub fn obstacle_interval_ticks(&self) -> u32 {
        secs_to_ticks(self.obstacle_interval_secs)
    }

    pub fn powerup_interval_ticks(&self) -> u32 {
        secs_to_ticks(self.powerup_interval_secs)
    }

    pub fn powerup_duration_ticks(&self) -> u32 {
        secs_to_ticks(self.powerup_duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tick_conversion() {
        let t = Tuning::default();
        assert_eq!(t.obstacle_interval_ticks(), 120);
        assert_eq!(t.powerup_interval_ticks(), 600);
        assert_eq!(t.powerup_duration_ticks(), 300);
        assert_eq!(secs_to_ticks(0.0), 1);
    }

    #[test]
    fn test_from_json_overrides() {
        let t = Tuning::from_json(r#"{ "challenge_goal": 50, "rain_chance": 0.0 }"#).unwrap();
        assert_eq!(t.challenge_goal, 50);
        assert_eq!(t.rain_chance, 0.0);
        assert_eq!(t.difficulty_interval, 500);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(Tuning::from_json(r#"{ "spawn_x_min": 600.0 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "difficulty_interval": 0 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "rain_chance": 2.0 }"#).is_err());
    }
}
