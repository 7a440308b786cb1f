//! In-memory statistics store with throttled durable flushes.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use btup_torrent_core::TorrentRecord;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{StatsError, StatsResult};
use crate::format::{STATS_HEADER, decode_line, encode_records};

/// Minimum number of seconds between two flushes of a dirty store.
pub const STATS_FLUSH_INTERVAL_SECS: u64 = 30;

/// Seeder statistics keyed by catalog name.
#[derive(Debug)]
pub struct StatsStore {
    path: PathBuf,
    records: BTreeMap<String, TorrentRecord>,
    dirty: bool,
    last_flush: u64,
}

impl StatsStore {
    /// Empty store that will persist to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
            dirty: false,
            last_flush: 0,
        }
    }

    /// Load the store from `path`; a missing file yields an empty store.
    ///
    /// Malformed lines are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read.
    pub fn load(path: impl Into<PathBuf>) -> StatsResult<Self> {
        let mut store = Self::new(path);
        let text = match fs::read_to_string(&store.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!(path = %store.path.display(), "no statistics file yet; starting empty");
                return Ok(store);
            }
            Err(source) => return Err(StatsError::io("stats.load", &store.path, source)),
        };

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || (idx == 0 && line == STATS_HEADER) {
                continue;
            }
            match decode_line(idx + 1, line) {
                Ok((name, record)) => {
                    store.records.insert(name, record);
                }
                Err(err) => {
                    warn!(path = %store.path.display(), error = ?err, "skipping stats line");
                }
            }
        }
        info!(
            path = %store.path.display(),
            records = store.records.len(),
            "statistics loaded"
        );
        Ok(store)
    }

    /// Number of tracked records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether in-memory state differs from the last flush.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record for `name`, if tracked.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TorrentRecord> {
        self.records.get(name)
    }

    /// Whether `name` is tracked.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Iterate records in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TorrentRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Insert or replace the record for `name`.
    pub fn insert(&mut self, name: impl Into<String>, record: TorrentRecord) {
        self.records.insert(name.into(), record);
        self.dirty = true;
    }

    /// Drop the record for `name`.
    pub fn remove(&mut self, name: &str) -> Option<TorrentRecord> {
        let removed = self.records.remove(name);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Store a measurement for an existing record.
    ///
    /// Returns `false` without inserting when `name` is no longer tracked, so
    /// an unregistered item is never brought back by a late measurement.
    pub fn record_measurement(&mut self, name: &str, at: u64, seeder_count: u32) -> bool {
        let Some(record) = self.records.get_mut(name) else {
            return false;
        };
        *record = TorrentRecord::measured(at, seeder_count);
        self.dirty = true;
        true
    }

    /// Refresh the measurement time of an existing record, keeping its count.
    pub fn touch(&mut self, name: &str, at: u64) -> bool {
        let Some(record) = self.records.get_mut(name) else {
            return false;
        };
        record.last_measured_time = at;
        self.dirty = true;
        true
    }

    /// Names and records ordered by ascending seeder count, ties by name.
    #[must_use]
    pub fn by_ascending_seeders(&self) -> Vec<(String, TorrentRecord)> {
        let mut ordered: Vec<_> = self
            .records
            .iter()
            .map(|(name, record)| (name.clone(), *record))
            .collect();
        ordered.sort_by_key(|(_, record)| record.seeder_count);
        ordered
    }

    /// Flush when dirty and at least [`STATS_FLUSH_INTERVAL_SECS`] have passed
    /// since the previous flush. Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns an error when the rewrite fails.
    pub fn flush_if_due(&mut self, now: u64) -> StatsResult<bool> {
        if !self.dirty || now.saturating_sub(self.last_flush) < STATS_FLUSH_INTERVAL_SECS {
            return Ok(false);
        }
        self.flush(now)?;
        Ok(true)
    }

    /// Rewrite the statistics file atomically and clear the dirty flag.
    ///
    /// # Errors
    ///
    /// Returns an error when the temporary file cannot be written or renamed.
    pub fn flush(&mut self, now: u64) -> StatsResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|source| StatsError::io("stats.flush.mkdir", &dir, source))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|source| StatsError::io("stats.flush.tempfile", &dir, source))?;
        tmp.write_all(encode_records(self.iter()).as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|source| StatsError::io("stats.flush.write", tmp.path(), source))?;
        tmp.persist(&self.path).map_err(|source| StatsError::Persist {
            path: self.path.clone(),
            source,
        })?;

        self.dirty = false;
        self.last_flush = now;
        debug!(path = %self.path.display(), records = self.records.len(), "statistics flushed");
        Ok(())
    }
}
