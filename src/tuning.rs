//! Data-driven game balance
//!
//! Every number the simulation depends on lives here so a JSON file can
//! override it without a rebuild. Defaults reproduce the shipped balance.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning validation failure
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("{field} must lie in [{min}, {max}], got {value}")]
    RangeViolation {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("{low_field} ({low}) must not exceed {high_field} ({high})")]
    Ordering {
        low_field: &'static str,
        low: f32,
        high_field: &'static str,
        high: f32,
    },
}

/// Score to scroll-speed / spawn-interval coupling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Scroll speed at score 0 (px/s)
    pub base_speed: f32,
    /// Scroll speed ceiling (px/s)
    pub max_speed: f32,
    /// Speed added per point
    pub speed_step: f32,
    /// Spawn interval at score 0 (s)
    pub base_interval: f32,
    /// Spawn interval floor (s)
    pub min_interval: f32,
    /// Interval removed per point
    pub interval_step: f32,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        Self {
            base_speed: 150.0,
            max_speed: 400.0,
            speed_step: 3.0,
            base_interval: 3.0,
            min_interval: 1.5,
            interval_step: 0.02,
        }
    }
}

/// Flyer physics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyerTuning {
    pub spawn_x: f32,
    pub spawn_y: f32,
    /// Collision radius used by both contact layers
    pub radius: f32,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Velocity set on a lift edge (negative is up)
    pub lift_velocity: f32,
    /// Floor height; reaching it is fatal
    pub ground_y: f32,
    /// Radians of tilt per px/s of vertical velocity
    pub rotation_per_velocity: f32,
    pub max_rotation_up: f32,
    pub max_rotation_down: f32,
}

impl Default for FlyerTuning {
    fn default() -> Self {
        Self {
            spawn_x: 200.0,
            spawn_y: 540.0,
            radius: 20.0,
            gravity: 980.0,
            lift_velocity: -350.0,
            ground_y: 1000.0,
            rotation_per_velocity: 0.003,
            max_rotation_up: -std::f32::consts::FRAC_PI_6,
            max_rotation_down: std::f32::consts::FRAC_PI_2,
        }
    }
}

/// Gate obstacle geometry and lifetime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTuning {
    pub spawn_x: f32,
    /// Gap anchor range for spawned obstacles
    pub min_gap_y: f32,
    pub max_gap_y: f32,
    pub half_width: f32,
    /// Bottom edge of the upper barrier relative to the anchor
    pub upper_gate_offset: f32,
    /// Top edge of the lower barrier relative to the anchor
    pub lower_gate_offset: f32,
    /// Crossing this x scores the obstacle
    pub passed_x: f32,
    pub despawn_x: f32,
}

impl Default for ObstacleTuning {
    fn default() -> Self {
        Self {
            spawn_x: 2000.0,
            min_gap_y: 200.0,
            max_gap_y: 880.0,
            half_width: 104.0,
            upper_gate_offset: -310.0,
            lower_gate_offset: 110.0,
            passed_x: 100.0,
            despawn_x: -200.0,
        }
    }
}

impl ObstacleTuning {
    /// Vertical gap height
    pub fn gap_height(&self) -> f32 {
        self.lower_gate_offset - self.upper_gate_offset
    }
}

/// Bonus pickup placement and motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    pub radius: f32,
    /// Inset from each gap edge when placing a pickup
    pub gap_margin: f32,
    /// Probability of producing a pickup on each spawn tick
    pub spawn_chance: f32,
    pub despawn_x: f32,
    /// Vertical bob amplitude (0 disables bobbing)
    pub bob_amplitude: f32,
    /// Bob angular frequency (rad/s)
    pub bob_frequency: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            radius: 24.0,
            gap_margin: 50.0,
            spawn_chance: 0.6,
            despawn_x: -100.0,
            bob_amplitude: 8.0,
            bob_frequency: 3.0,
        }
    }
}

/// Playfield limits enforced by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub upper_bound: f32,
    pub lower_bound: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            upper_bound: -50.0,
            lower_bound: 1130.0,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub difficulty: DifficultyTuning,
    pub flyer: FlyerTuning,
    pub obstacle: ObstacleTuning,
    pub pickup: PickupTuning,
    pub arena: ArenaTuning,
}

impl Tuning {
    /// Check the invariants the simulation relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound or ordering.
    pub fn validate(&self) -> Result<(), TuningError> {
        let d = &self.difficulty;
        positive("difficulty.base_speed", d.base_speed)?;
        ordered("difficulty.base_speed", d.base_speed, "difficulty.max_speed", d.max_speed)?;
        non_negative("difficulty.speed_step", d.speed_step)?;
        positive("difficulty.min_interval", d.min_interval)?;
        ordered(
            "difficulty.min_interval",
            d.min_interval,
            "difficulty.base_interval",
            d.base_interval,
        )?;
        non_negative("difficulty.interval_step", d.interval_step)?;

        positive("flyer.radius", self.flyer.radius)?;
        non_negative("flyer.gravity", self.flyer.gravity)?;

        let o = &self.obstacle;
        positive("obstacle.half_width", o.half_width)?;
        ordered("obstacle.min_gap_y", o.min_gap_y, "obstacle.max_gap_y", o.max_gap_y)?;
        ordered(
            "obstacle.upper_gate_offset",
            o.upper_gate_offset,
            "obstacle.lower_gate_offset",
            o.lower_gate_offset,
        )?;
        ordered("obstacle.despawn_x", o.despawn_x, "obstacle.passed_x", o.passed_x)?;

        let p = &self.pickup;
        in_range("pickup.spawn_chance", p.spawn_chance, 0.0, 1.0)?;
        non_negative("pickup.gap_margin", p.gap_margin)?;
        if 2.0 * p.gap_margin > o.gap_height() {
            return Err(TuningError::Ordering {
                low_field: "2 * pickup.gap_margin",
                low: 2.0 * p.gap_margin,
                high_field: "obstacle gap height",
                high: o.gap_height(),
            });
        }

        ordered(
            "arena.upper_bound",
            self.arena.upper_bound,
            "arena.lower_bound",
            self.arena.lower_bound,
        )?;
        Ok(())
    }

    /// Load tuning from a JSON file, falling back to defaults.
    ///
    /// Missing fields take their default values. A file that cannot be read,
    /// parsed or validated is reported and ignored.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Tuning>(&json) {
                Ok(tuning) => match tuning.validate() {
                    Ok(()) => {
                        log::info!("Loaded tuning from {}", path.display());
                        return tuning;
                    }
                    Err(e) => log::warn!("Rejected tuning {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Could not parse tuning {}: {}", path.display(), e),
            },
            Err(e) => log::info!("No tuning at {} ({}), using defaults", path.display(), e),
        }
        Self::default()
    }
}

fn in_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), TuningError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::RangeViolation {
            field,
            min: f32::MIN_POSITIVE,
            max: f32::MAX,
            value,
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    in_range(field, value, 0.0, f32::MAX)
}

fn ordered(
    low_field: &'static str,
    low: f32,
    high_field: &'static str,
    high: f32,
) -> Result<(), TuningError> {
    if low <= high {
        Ok(())
    } else {
        Err(TuningError::Ordering {
            low_field,
            low,
            high_field,
            high,
        })
    }
}
