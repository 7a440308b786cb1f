use std::path::PathBuf;
use std::time::Duration;

use btup_config::defaults::{GIB, RECOUNT_TIMEOUT_SECS};
use btup_config::{ConfigError, SeederConfigInput, validate};

fn failing_field(input: SeederConfigInput) -> Option<String> {
    match validate(input) {
        Err(ConfigError::InvalidField { field, .. }) => Some(field),
        Ok(_) => None,
    }
}

#[test]
fn defaults_validate() -> anyhow::Result<()> {
    let config = validate(SeederConfigInput::default())?;
    assert_eq!(config.update_delay, Duration::from_secs(10));
    assert_eq!(config.min_seeders_to_ignore, 3);
    assert_eq!(config.min_recount_age_secs, 86_400);
    assert_eq!(config.max_parallel_recounts, 100);
    assert_eq!(config.capacity_bytes, 100 * GIB);
    assert_eq!(config.recount_timeout_secs, RECOUNT_TIMEOUT_SECS);
    assert!(config.scratch_dir.starts_with("/tmp/btup"));
    Ok(())
}

#[test]
fn zero_parallelism_is_rejected() {
    let input = SeederConfigInput {
        max_parallel_recounts: 0,
        ..SeederConfigInput::default()
    };
    assert_eq!(failing_field(input).as_deref(), Some("max_parallel_recounts"));
}

#[test]
fn zero_capacity_is_rejected() {
    let input = SeederConfigInput {
        max_data_size_gib: 0,
        ..SeederConfigInput::default()
    };
    assert_eq!(failing_field(input).as_deref(), Some("max_data_size"));
}

#[test]
fn zero_update_delay_is_rejected() {
    let input = SeederConfigInput {
        update_delay_secs: 0,
        ..SeederConfigInput::default()
    };
    assert_eq!(failing_field(input).as_deref(), Some("update_delay"));
}

#[test]
fn identical_data_and_scratch_dirs_are_rejected() {
    let input = SeederConfigInput {
        data_dir: PathBuf::from("/srv/shared"),
        scratch_dir: PathBuf::from("/srv/shared"),
        ..SeederConfigInput::default()
    };
    assert_eq!(failing_field(input).as_deref(), Some("scratch_dir"));
}
