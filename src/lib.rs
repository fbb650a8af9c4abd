//! Flappy Gates - a gated side-scroller session core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, spawners, session state machine)
//! - `stats`: Session summaries and lifetime statistics
//! - `persistence`: Stats stores with backup rotation
//! - `settings`: Runner preferences
//! - `tuning`: Data-driven game balance

pub mod persistence;
pub mod settings;
pub mod sim;
pub mod stats;
pub mod tuning;

pub use persistence::{JsonFileStore, MemoryStore, StatsStore, StoreError};
pub use settings::{Settings, SettingsError};
pub use sim::{GameEvent, GameSession, SessionState, TickInput};
pub use stats::{AggregateStatistics, SessionRecord, SessionSummary};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame time fed to the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
}
