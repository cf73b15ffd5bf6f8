use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScheduleError};

/// Scoring weights of the greedy engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringWeights {
    /// Per occupied neighbouring period of a candidate slot.
    pub slot_adjacency: f64,
    /// Slot already holds one student out of two.
    pub half_pair: f64,
    /// Per assignment already placed on the slot's date.
    pub date_concentration: f64,
    /// Per own assignment of the student in a neighbouring period.
    pub student_continuity: f64,
    /// Student already comes in that day.
    pub same_day: f64,
    /// Per unit of the student's remaining demand.
    pub remaining_demand: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            slot_adjacency: 100.0,
            half_pair: 5000.0,
            date_concentration: 10.0,
            student_continuity: 20000.0,
            same_day: 500.0,
            remaining_demand: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// December belongs to this year, January to the next.
    pub academic_year: i32,
    pub seed: u64,
    pub max_iterations: u32,
    /// Most lessons one student takes on a single date.
    pub daily_limit: u32,
    pub weights: ScoringWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            academic_year: 2025,
            seed: 42,
            max_iterations: 3000,
            daily_limit: 3,
            weights: ScoringWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<EngineConfig> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ScheduleError::InvalidConfig(
                "maxIterations must be at least 1".to_string(),
            ));
        }
        if self.daily_limit == 0 {
            return Err(ScheduleError::InvalidConfig(
                "dailyLimit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
