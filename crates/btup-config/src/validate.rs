//! Conversion of operator input into a validated [`SeederConfig`].

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::defaults::{GIB, RECOUNT_TIMEOUT_SECS};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{SeederConfig, SeederConfigInput};

/// Validate `input` and convert units.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for a zero update delay, zero
/// parallelism, a zero or overflowing capacity, or overlapping directories.
pub fn validate(input: SeederConfigInput) -> ConfigResult<SeederConfig> {
    if input.update_delay_secs == 0 {
        return Err(ConfigError::invalid(
            "update_delay",
            input.update_delay_secs,
            "must_be_positive",
        ));
    }
    if input.max_parallel_recounts == 0 {
        return Err(ConfigError::invalid(
            "max_parallel_recounts",
            input.max_parallel_recounts,
            "must_be_positive",
        ));
    }
    let capacity_bytes = capacity_bytes(input.max_data_size_gib)?;
    reject_same_dir("scratch_dir", &input.scratch_dir, &input.data_dir)?;
    reject_same_dir("data_dir", &input.data_dir, &input.torrents_dir)?;
    reject_same_dir("scratch_dir", &input.scratch_dir, &input.torrents_dir)?;

    let config = SeederConfig {
        update_delay: Duration::from_secs(input.update_delay_secs),
        min_seeders_to_ignore: input.min_seeders_to_ignore,
        min_recount_age_secs: input.min_recount_age_secs,
        max_parallel_recounts: input.max_parallel_recounts,
        recount_timeout_secs: RECOUNT_TIMEOUT_SECS,
        torrents_dir: input.torrents_dir,
        data_dir: input.data_dir,
        scratch_dir: input.scratch_dir,
        capacity_bytes,
        stats_file: input.stats_file,
    };
    debug!(?config, "configuration validated");
    Ok(config)
}

fn capacity_bytes(gib: u64) -> ConfigResult<u64> {
    if gib == 0 {
        return Err(ConfigError::invalid("max_data_size", gib, "must_be_positive"));
    }
    gib.checked_mul(GIB)
        .ok_or_else(|| ConfigError::invalid("max_data_size", gib, "overflow"))
}

fn reject_same_dir(field: &str, path: &Path, other: &Path) -> ConfigResult<()> {
    if path == other {
        return Err(ConfigError::invalid(
            field,
            path.display(),
            "conflicts_with_other_directory",
        ));
    }
    Ok(())
}
