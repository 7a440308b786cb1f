//! Default values for command-line options and fixed controller timings.
//!
//! # Design
//! - Keep every default in one place so the CLI and tests agree.
//! - Fixed timings are not configurable from the command line.

use std::path::PathBuf;

/// Seconds between slow reconciliation passes.
pub const UPDATE_DELAY_SECS: u64 = 10;
/// Seeder count at or above which an item is not seeded.
pub const MIN_SEEDERS_TO_IGNORE: u32 = 3;
/// Minimum age, in seconds, of a measurement before it is retaken.
pub const MIN_RECOUNT_AGE_SECS: u64 = 86_400;
/// Maximum number of concurrent recount participants.
pub const MAX_PARALLEL_RECOUNTS: usize = 100;
/// Disk budget in GiB.
pub const MAX_DATA_SIZE_GIB: u64 = 100;
/// Catalog directory.
pub const TORRENTS_DIR: &str = "./torrents";
/// Data directory.
pub const DATA_DIR: &str = "./data";
/// Statistics file.
pub const STATS_FILE: &str = "stats.txt";

/// Age after which a recount participant is finalized with the peer-count
/// fallback.
pub const RECOUNT_TIMEOUT_SECS: u64 = 30;
/// Period of the controller loop in milliseconds.
pub const TICK_MILLIS: u64 = 1_000;

/// Bytes per GiB.
pub const GIB: u64 = 1024 * 1024 * 1024;

/// Per-process scratch directory, `/tmp/btup/<pid>`.
#[must_use]
pub fn scratch_dir() -> PathBuf {
    PathBuf::from("/tmp/btup").join(std::process::id().to_string())
}
