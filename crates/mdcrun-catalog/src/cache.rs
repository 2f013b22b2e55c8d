//! On-disk cache of the remote catalog.
//!
//! A single JSON record `{timestamp, files}` holds the last successful remote
//! listing. The record is replaced wholesale on every store and removed on a
//! forced refresh. Reads and writes are not atomic; one process at a time is
//! assumed to own the file.

use crate::descriptor::AutomationDescriptor;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Persisted cache record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// When the listing was fetched
    pub timestamp: DateTime<Utc>,
    /// Descriptors returned by the remote catalog
    pub files: Vec<AutomationDescriptor>,
}

/// Snapshot of the cache state for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    /// Fetch time of the cached listing, if a record exists
    pub timestamp: Option<DateTime<Utc>>,
    /// Number of cached descriptors
    pub entries: usize,
    /// Whether the record is still within its TTL
    pub fresh: bool,
}

/// Whether a record fetched at `cached_at` is still valid at `now`.
///
/// Valid iff `now - cached_at < ttl`; an age exactly equal to the TTL is
/// expired.
pub fn is_fresh(now: DateTime<Utc>, cached_at: DateTime<Utc>, ttl: Duration) -> bool {
    match chrono::Duration::from_std(ttl) {
        Ok(ttl) => now.signed_duration_since(cached_at) < ttl,
        // TTL beyond chrono's range never expires
        Err(_) => true,
    }
}

/// File-backed catalog cache with a fixed TTL
#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: PathBuf,
    ttl: Duration,
}

impl CatalogCache {
    /// Create a cache stored at `path`
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    /// Location of the cache record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read the record. Missing or malformed files read as `None`.
    pub fn load(&self) -> Option<CacheRecord> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Ignoring malformed cache record");
                None
            }
        }
    }

    /// Cached descriptors if the record is still fresh at `now`
    pub fn load_fresh(&self, now: DateTime<Utc>) -> Option<Vec<AutomationDescriptor>> {
        self.load()
            .filter(|record| is_fresh(now, record.timestamp, self.ttl))
            .map(|record| record.files)
    }

    /// Replace the record with `files` fetched at `now`
    pub fn store(&self, files: &[AutomationDescriptor], now: DateTime<Utc>) -> Result<()> {
        let record = CacheRecord {
            timestamp: now,
            files: files.to_vec(),
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(&record)?)?;
        debug!(path = %self.path.display(), entries = files.len(), "Stored catalog cache");
        Ok(())
    }

    /// Delete the record so the next load goes to the network
    pub fn invalidate(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Current cache state at `now`
    pub fn status(&self, now: DateTime<Utc>) -> CacheStatus {
        match self.load() {
            Some(record) => CacheStatus {
                timestamp: Some(record.timestamp),
                entries: record.files.len(),
                fresh: is_fresh(now, record.timestamp, self.ttl),
            },
            None => CacheStatus {
                timestamp: None,
                entries: 0,
                fresh: false,
            },
        }
    }
}
