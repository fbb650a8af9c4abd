//! Runner settings and preferences
//!
//! Persisted as JSON next to the stats file. Balance numbers live in
//! [`crate::tuning`], not here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings are not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("frame_dt must be a positive number of seconds no smaller than {min}, got {value}")]
    FrameDt { min: f32, value: f32 },
}

/// Smallest frame time that still moves the fixed-step accumulator
pub const MIN_FRAME_DT: f32 = 1.0e-4;

/// Runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Storage ===
    /// Where session statistics are kept
    pub stats_path: PathBuf,
    /// Optional balance override file
    pub tuning_path: Option<PathBuf>,

    // === Gameplay ===
    /// Fixed RNG seed; `None` seeds from the clock
    pub seed: Option<u64>,
    /// Spawn bonus pickups
    pub pickups_enabled: bool,
    /// Let the idle pilot fly
    pub autopilot: bool,

    // === Runner ===
    /// Number of sessions to play before exiting
    pub sessions: u32,
    /// Per-session step cap (sessions that survive this long are ended)
    pub max_frames: u64,
    /// Frame time fed to the fixed-step accumulator (seconds)
    pub frame_dt: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stats_path: PathBuf::from("flappy_gates_stats.json"),
            tuning_path: None,

            seed: None,
            pickups_enabled: true,
            autopilot: true,

            sessions: 5,
            // Two minutes at 120 Hz
            max_frames: 14_400,
            frame_dt: 1.0 / 60.0,
        }
    }
}

impl Settings {
    /// Check values the runner loop depends on
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.frame_dt.is_finite() || self.frame_dt < MIN_FRAME_DT {
            return Err(SettingsError::FrameDt {
                min: MIN_FRAME_DT,
                value: self.frame_dt,
            });
        }
        Ok(())
    }

    /// Read and validate settings from `path`
    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e @ SettingsError::FrameDt { .. }) => {
                log::warn!("Rejected settings {}: {}", path.display(), e);
                Self::default()
            }
            Err(e) => {
                log::info!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
