//! Configuration models.
//!
//! # Design
//! - `SeederConfigInput` mirrors the command line, units included.
//! - `SeederConfig` is the validated form the controller consumes.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Unvalidated settings as supplied by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeederConfigInput {
    /// Seconds between slow reconciliation passes.
    pub update_delay_secs: u64,
    /// Ignore threshold on seeder counts.
    pub min_seeders_to_ignore: u32,
    /// Minimum measurement age in seconds before a recount.
    pub min_recount_age_secs: u64,
    /// Recount parallelism cap.
    pub max_parallel_recounts: usize,
    /// Catalog directory.
    pub torrents_dir: PathBuf,
    /// Data directory.
    pub data_dir: PathBuf,
    /// Scratch directory.
    pub scratch_dir: PathBuf,
    /// Disk budget in GiB.
    pub max_data_size_gib: u64,
    /// Statistics file.
    pub stats_file: PathBuf,
}

impl Default for SeederConfigInput {
    fn default() -> Self {
        Self {
            update_delay_secs: defaults::UPDATE_DELAY_SECS,
            min_seeders_to_ignore: defaults::MIN_SEEDERS_TO_IGNORE,
            min_recount_age_secs: defaults::MIN_RECOUNT_AGE_SECS,
            max_parallel_recounts: defaults::MAX_PARALLEL_RECOUNTS,
            torrents_dir: PathBuf::from(defaults::TORRENTS_DIR),
            data_dir: PathBuf::from(defaults::DATA_DIR),
            scratch_dir: defaults::scratch_dir(),
            max_data_size_gib: defaults::MAX_DATA_SIZE_GIB,
            stats_file: PathBuf::from(defaults::STATS_FILE),
        }
    }
}

/// Validated controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeederConfig {
    /// Interval between slow reconciliation passes.
    pub update_delay: Duration,
    /// Items with at least this many seeders are not seeded.
    pub min_seeders_to_ignore: u32,
    /// Minimum measurement age in seconds before a recount.
    pub min_recount_age_secs: u64,
    /// Recount parallelism cap, at least one.
    pub max_parallel_recounts: usize,
    /// Age in seconds after which a recount is finalized by timeout.
    pub recount_timeout_secs: u64,
    /// Catalog directory.
    pub torrents_dir: PathBuf,
    /// Data directory.
    pub data_dir: PathBuf,
    /// Scratch directory.
    pub scratch_dir: PathBuf,
    /// Disk budget in bytes, non-zero.
    pub capacity_bytes: u64,
    /// Statistics file.
    pub stats_file: PathBuf,
}
