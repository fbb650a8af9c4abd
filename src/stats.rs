//! Session summaries and lifetime statistics
//!
//! `StatsBook` is the in-memory model every store keeps: a running aggregate
//! plus a bounded, chronological session history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of session records to keep
pub const MAX_SESSION_HISTORY: usize = 1000;

/// Default number of sessions returned by history queries
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// What one finished session produced. Built once at session end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    score: u32,
    obstacles_passed: u32,
    coins_collected: u32,
    duration_secs: f64,
}

impl SessionSummary {
    pub fn new(score: u32, obstacles_passed: u32, coins_collected: u32, duration_secs: f64) -> Self {
        Self {
            score,
            obstacles_passed,
            coins_collected,
            duration_secs,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn obstacles_passed(&self) -> u32 {
        self.obstacles_passed
    }

    pub fn coins_collected(&self) -> u32 {
        self.coins_collected
    }

    /// Wall-clock length of the session in seconds
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }
}

/// Lifetime totals across all recorded sessions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateStatistics {
    pub high_score: u32,
    pub total_games_played: u32,
    /// Every session ends in a death, so this tracks games played
    pub total_deaths: u32,
    pub total_obstacles_passed: u64,
    pub total_coins_collected: u64,
    pub last_played: Option<DateTime<Utc>>,
    /// Integer running mean (truncated)
    pub average_score: u32,
}

impl AggregateStatistics {
    /// Fold one finished session into the totals
    pub fn apply(&mut self, summary: &SessionSummary, now: DateTime<Utc>) {
        let old_games = u64::from(self.total_games_played);
        let new_games = old_games + 1;

        self.high_score = self.high_score.max(summary.score());
        self.total_games_played = self.total_games_played.saturating_add(1);
        self.total_deaths = self.total_deaths.saturating_add(1);
        self.total_obstacles_passed += u64::from(summary.obstacles_passed());
        self.total_coins_collected += u64::from(summary.coins_collected());
        self.last_played = Some(now);

        let sum = u64::from(self.average_score) * old_games + u64::from(summary.score());
        self.average_score = (sum / new_games) as u32;
    }
}

/// A persisted session summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: u64,
    pub score: u32,
    pub obstacles_passed: u32,
    pub coins_collected: u32,
    pub duration_secs: f64,
    pub played_at: DateTime<Utc>,
}

/// Aggregate plus history, as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsBook {
    pub statistics: AggregateStatistics,
    /// Oldest first
    pub sessions: Vec<SessionRecord>,
    next_id: u64,
}

impl Default for StatsBook {
    fn default() -> Self {
        Self {
            statistics: AggregateStatistics::default(),
            sessions: Vec::new(),
            next_id: 1,
        }
    }
}

impl StatsBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished session and update the aggregate
    pub fn record(&mut self, summary: &SessionSummary, now: DateTime<Utc>) -> &SessionRecord {
        self.statistics.apply(summary, now);

        let id = self.next_id;
        self.next_id += 1;
        self.sessions.push(SessionRecord {
            id,
            score: summary.score(),
            obstacles_passed: summary.obstacles_passed(),
            coins_collected: summary.coins_collected(),
            duration_secs: summary.duration_secs(),
            played_at: now,
        });

        if self.sessions.len() > MAX_SESSION_HISTORY {
            let excess = self.sessions.len() - MAX_SESSION_HISTORY;
            self.sessions.drain(..excess);
        }

        &self.sessions[self.sessions.len() - 1]
    }

    /// Up to `limit` records, newest first
    pub fn recent(&self, limit: usize) -> Vec<SessionRecord> {
        self.sessions.iter().rev().take(limit).cloned().collect()
    }

    /// Forget everything
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_first_session() {
        let mut book = StatsBook::new();
        let now = Utc::now();
        book.record(&SessionSummary::new(10, 10, 3, 42.0), now);

        let stats = &book.statistics;
        assert_eq!(stats.high_score, 10);
        assert_eq!(stats.total_games_played, 1);
        assert_eq!(stats.total_deaths, 1);
        assert_eq!(stats.average_score, 10);
        assert_eq!(stats.total_obstacles_passed, 10);
        assert_eq!(stats.total_coins_collected, 3);
        assert_eq!(stats.last_played, Some(now));
    }

    #[test]
    fn test_average_truncates() {
        let mut book = StatsBook::new();
        let now = Utc::now();
        book.record(&SessionSummary::new(10, 10, 0, 1.0), now);
        book.record(&SessionSummary::new(5, 5, 0, 1.0), now);
        // (10 + 5) / 2 = 7.5
        assert_eq!(book.statistics.average_score, 7);
        assert_eq!(book.statistics.high_score, 10);

        // Running mean uses the truncated value: (7 * 2 + 0) / 3 = 4
        book.record(&SessionSummary::new(0, 0, 0, 1.0), now);
        assert_eq!(book.statistics.average_score, 4);
        assert_eq!(book.statistics.total_games_played, 3);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut book = StatsBook::new();
        let start = Utc::now();
        for score in 0..15 {
            book.record(
                &SessionSummary::new(score, score, 0, 1.0),
                start + TimeDelta::seconds(i64::from(score)),
            );
        }

        let recent = book.recent(DEFAULT_RECENT_LIMIT);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].score, 14);
        assert_eq!(recent[9].score, 5);
        assert!(recent.windows(2).all(|w| w[0].played_at > w[1].played_at));
        assert_eq!(book.recent(100).len(), 15);
    }

    #[test]
    fn test_record_ids_are_unique() {
        let mut book = StatsBook::new();
        let now = Utc::now();
        let a = book.record(&SessionSummary::new(1, 1, 0, 1.0), now).id;
        let b = book.record(&SessionSummary::new(2, 2, 0, 1.0), now).id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_history_is_capped() {
        let mut book = StatsBook::new();
        let now = Utc::now();
        for score in 0..(MAX_SESSION_HISTORY as u32 + 5) {
            book.record(&SessionSummary::new(score, score, 0, 1.0), now);
        }
        assert_eq!(book.sessions.len(), MAX_SESSION_HISTORY);
        assert_eq!(book.sessions[0].score, 5);
        // The aggregate still counts every game
        assert_eq!(
            book.statistics.total_games_played,
            MAX_SESSION_HISTORY as u32 + 5
        );
    }

    #[test]
    fn test_reset() {
        let mut book = StatsBook::new();
        book.record(&SessionSummary::new(9, 9, 2, 3.0), Utc::now());
        book.reset();
        assert!(book.is_empty());
        assert_eq!(book.statistics, AggregateStatistics::default());
    }
}
