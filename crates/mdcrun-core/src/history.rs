//! Execution history as a JSON-lines file

use crate::bridge::ExecutionOutcome;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Number of records shown when no limit is given
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

/// One executed prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// When the execution finished
    pub timestamp: DateTime<Utc>,
    /// Prompt as typed
    pub prompt: String,
    /// Name of the matched script
    pub script_name: String,
    /// Match confidence
    pub confidence: f64,
    /// Bridge outcome
    pub outcome: ExecutionOutcome,
}

/// Append-only execution log
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record
    pub fn append(&self, record: &ExecutionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        debug!(path = %self.path.display(), "Recorded execution");
        Ok(())
    }

    /// Up to `limit` records, newest first. Unparseable lines are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<ExecutionRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let records = content
            .lines()
            .rev()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed history line");
                    None
                }
            })
            .take(limit)
            .collect();
        Ok(records)
    }

    /// Remove all records
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ExecutionErrorKind;

    fn record(prompt: &str) -> ExecutionRecord {
        ExecutionRecord {
            timestamp: Utc::now(),
            prompt: prompt.to_string(),
            script_name: "a.mdc".to_string(),
            confidence: 0.8,
            outcome: ExecutionOutcome::failed("mdc_files/a.mdc", ExecutionErrorKind::Spawn, "nope"),
        }
    }

    #[test]
    fn test_recent_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("logs/history.jsonl"));
        for p in ["one", "two", "three"] {
            store.append(&record(p)).unwrap();
        }

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].prompt, "three");
        assert_eq!(recent[1].prompt, "two");
        assert_eq!(recent[0].outcome.error_kind, Some(ExecutionErrorKind::Spawn));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.jsonl"));
        store.append(&record("good")).unwrap();
        let mut file = OpenOptions::new().append(true).open(store.path()).unwrap();
        writeln!(file, "{{broken").unwrap();

        let recent = store.recent(DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].prompt, "good");
    }

    #[test]
    fn test_missing_file_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.jsonl"));
        assert!(store.recent(5).unwrap().is_empty());
        store.clear().unwrap();

        store.append(&record("x")).unwrap();
        store.clear().unwrap();
        assert!(store.recent(5).unwrap().is_empty());
    }
}
