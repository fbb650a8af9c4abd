//! Session statistics persistence
//!
//! Features:
//! - `StatsStore` contract used by the session orchestrator
//! - In-memory store for tests and throwaway runs
//! - Versioned JSON file store with backup rotation and corruption recovery

pub mod file;

pub use file::JsonFileStore;

use chrono::Utc;
use thiserror::Error;

use crate::stats::{AggregateStatistics, SessionRecord, SessionSummary, StatsBook};

/// Persistence failures. Never fatal to a running game.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stats file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stats file version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable home for finished sessions and lifetime totals
pub trait StatsStore {
    /// Record one finished session and fold it into the aggregate
    fn save_session(&mut self, summary: &SessionSummary) -> Result<(), StoreError>;

    fn statistics(&self) -> Result<AggregateStatistics, StoreError>;

    /// Up to `limit` records, newest first
    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError>;

    /// Clear history and zero the aggregate
    fn reset(&mut self) -> Result<(), StoreError>;
}

/// Non-durable store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    book: StatsBook,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn book(&self) -> &StatsBook {
        &self.book
    }
}

impl StatsStore for MemoryStore {
    fn save_session(&mut self, summary: &SessionSummary) -> Result<(), StoreError> {
        self.book.record(summary, Utc::now());
        Ok(())
    }

    fn statistics(&self) -> Result<AggregateStatistics, StoreError> {
        Ok(self.book.statistics.clone())
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.book.recent(limit))
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.book.reset();
        Ok(())
    }
}
