//! JSON file store
//!
//! On-disk format is a versioned envelope `{ "version": 1, "book": {...} }`.
//! Saves go to `<path>.tmp` first; the previous file is rotated to
//! `<path>.bak` before the temp file is renamed into place.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{StatsStore, StoreError};
use crate::stats::{AggregateStatistics, SessionRecord, SessionSummary, StatsBook};

/// Current envelope version
pub const STATS_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<B> {
    version: u32,
    book: B,
}

/// Version is read on its own so a newer layout is reported as such instead
/// of as a parse error.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// File-backed `StatsStore`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    book: StatsBook,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A corrupt main file falls back to the backup. A missing file starts
    /// an empty book; nothing is written until the first save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let book = load_book(&path)?;
        Ok(Self { path, book })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        sibling(&self.path, "bak")
    }

    /// Write the current book to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.write_book(&self.book)
    }

    /// Persist `book`, then adopt it. On failure the in-memory book is
    /// left as it was.
    fn commit(&mut self, book: StatsBook) -> Result<(), StoreError> {
        self.write_book(&book)?;
        self.book = book;
        Ok(())
    }

    fn write_book(&self, book: &StatsBook) -> Result<(), StoreError> {
        let envelope = Envelope {
            version: STATS_FILE_VERSION,
            book,
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = sibling(&self.path, "tmp");
        let mut file = File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        if self.path.exists() {
            fs::rename(&self.path, self.backup_path())?;
        }
        fs::rename(&tmp_path, &self.path)?;

        log::debug!(
            "Saved {} sessions to {}",
            book.sessions.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl StatsStore for JsonFileStore {
    fn save_session(&mut self, summary: &SessionSummary) -> Result<(), StoreError> {
        let mut book = self.book.clone();
        book.record(summary, Utc::now());
        self.commit(book)
    }

    fn statistics(&self) -> Result<AggregateStatistics, StoreError> {
        Ok(self.book.statistics.clone())
    }

    fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self.book.recent(limit))
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.commit(StatsBook::new())?;
        log::info!("Statistics reset");
        Ok(())
    }
}

/// `<path>.<suffix>`, keeping the original extension
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn read_book(path: &Path) -> Result<StatsBook, StoreError> {
    let json = fs::read_to_string(path)?;

    let probe: VersionProbe = serde_json::from_str(&json)?;
    if probe.version != STATS_FILE_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: probe.version,
            expected: STATS_FILE_VERSION,
        });
    }

    let envelope: Envelope<StatsBook> = serde_json::from_str(&json)?;
    Ok(envelope.book)
}

fn load_book(path: &Path) -> Result<StatsBook, StoreError> {
    let backup = sibling(path, "bak");

    if !path.exists() {
        if backup.exists() {
            log::warn!("{} missing, restoring from backup", path.display());
            return read_book(&backup);
        }
        log::info!("No stats at {}, starting fresh", path.display());
        return Ok(StatsBook::new());
    }

    match read_book(path) {
        Ok(book) => {
            log::info!(
                "Loaded {} sessions from {}",
                book.sessions.len(),
                path.display()
            );
            Ok(book)
        }
        Err(e) if backup.exists() => {
            log::warn!("{} unreadable ({}), trying backup", path.display(), e);
            read_book(&backup).map_err(|backup_err| {
                log::error!("Backup unreadable too: {}", backup_err);
                e
            })
        }
        Err(e) => Err(e),
    }
}
