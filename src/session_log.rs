use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;
use crate::session::{GameMode, SessionResult};

/// One finished set as it appears in the results log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub played_at: DateTime<Local>,
    pub mode: GameMode,
    pub duration_secs: f64,
    pub tempo_bpm: u32,
    pub score: u32,
    pub accuracy: f64,
    pub max_combo: u32,
    pub coins_earned: i64,
}

impl SessionRecord {
    pub fn from_result(
        result: &SessionResult,
        mode: GameMode,
        duration_secs: f64,
        tempo_bpm: u32,
    ) -> Self {
        Self {
            played_at: Local::now(),
            mode,
            duration_secs,
            tempo_bpm,
            score: result.score,
            accuracy: result.accuracy,
            max_combo: result.max_combo,
            coins_earned: result.coins_earned,
        }
    }
}

/// Append-only CSV log of finished sets.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    pub fn new() -> Self {
        let path = AppDirs::log_path().unwrap_or_else(|| PathBuf::from("takt_sessions.csv"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header only when the file is new.
    pub fn append(&self, record: &SessionRecord) -> csv::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let needs_headers = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_headers)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// Most recent records, newest first. A missing or unreadable log
    /// reads as empty; rows that fail to parse are skipped.
    pub fn recent(&self, limit: usize) -> Vec<SessionRecord> {
        let Ok(mut reader) = csv::Reader::from_path(&self.path) else {
            return Vec::new();
        };
        reader
            .deserialize::<SessionRecord>()
            .flatten()
            .sorted_by(|a, b| b.played_at.cmp(&a.played_at))
            .take(limit)
            .collect()
    }

    pub fn last_played(&self) -> Option<DateTime<Local>> {
        self.recent(1).first().map(|record| record.played_at)
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}
