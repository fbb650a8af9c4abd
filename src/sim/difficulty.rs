//! Score-driven difficulty
//!
//! Scroll speed rises and spawn interval falls linearly with score until
//! each hits its clamp. The current value is the single source of truth
//! for every entity's scroll speed.

use serde::{Deserialize, Serialize};

use crate::tuning::DifficultyTuning;

/// Highest display level
pub const MAX_DIFFICULTY_LEVEL: u8 = 10;

/// Scroll speed and spawn cadence for the current score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Leftward speed of obstacles and pickups (px/s)
    pub scroll_speed: f32,
    /// Seconds between spawn ticks
    pub spawn_interval: f32,
}

impl Difficulty {
    /// Difficulty at score 0
    pub fn base(params: &DifficultyTuning) -> Self {
        Self {
            scroll_speed: params.base_speed,
            spawn_interval: params.base_interval,
        }
    }
}

/// Map a cumulative score to its clamped difficulty
pub fn scale(params: &DifficultyTuning, score: u32) -> Difficulty {
    let score = score as f32;
    Difficulty {
        scroll_speed: (params.base_speed + score * params.speed_step).min(params.max_speed),
        spawn_interval: (params.base_interval - score * params.interval_step)
            .max(params.min_interval),
    }
}

/// 1..=10 display level derived from scroll speed progress.
///
/// Not used by gameplay.
pub fn difficulty_level(params: &DifficultyTuning, difficulty: &Difficulty) -> u8 {
    let span = params.max_speed - params.base_speed;
    if span <= 0.0 {
        return 1;
    }
    let progress = (difficulty.scroll_speed - params.base_speed) / span;
    let level = (progress * 10.0).floor() as i32 + 1;
    level.clamp(1, MAX_DIFFICULTY_LEVEL as i32) as u8
}

/// Holds the live difficulty between score changes
#[derive(Debug, Clone)]
pub struct DifficultyScaler {
    params: DifficultyTuning,
    current: Difficulty,
}

impl DifficultyScaler {
    pub fn new(params: DifficultyTuning) -> Self {
        Self {
            current: Difficulty::base(&params),
            params,
        }
    }

    /// Recompute for a new score. Call once per score change.
    pub fn update(&mut self, score: u32) -> Difficulty {
        self.current = scale(&self.params, score);
        self.current
    }

    /// Return to base values
    pub fn reset(&mut self) {
        self.current = Difficulty::base(&self.params);
    }

    pub fn current(&self) -> &Difficulty {
        &self.current
    }

    pub fn level(&self) -> u8 {
        difficulty_level(&self.params, &self.current)
    }

    pub fn params(&self) -> &DifficultyTuning {
        &self.params
    }
}
