//! Command-line surface of the `btup` binary.

use std::path::PathBuf;

use btup_config::SeederConfigInput;
use btup_config::defaults;
use btup_telemetry::LogFormat;
use clap::{ArgAction, Parser, ValueEnum};

/// Scarcity-driven seeding controller.
#[derive(Debug, Parser)]
#[command(
    name = "btup",
    version,
    disable_version_flag = true,
    about = "Seed the torrents with the fewest seeders within a disk budget"
)]
pub struct Cli {
    /// Run reconciliation and admission every N seconds. Seeders are
    /// recounted continuously and independently of this delay.
    #[arg(short = 'u', long, env = "BTUP_UPDATE_DELAY", default_value_t = defaults::UPDATE_DELAY_SECS)]
    pub update_delay: u64,
    /// Do not seed torrents with this many seeders or more.
    #[arg(short = 'i', long, env = "BTUP_MIN_SEEDERS_TO_IGNORE", default_value_t = defaults::MIN_SEEDERS_TO_IGNORE)]
    pub min_seeders_to_ignore: u32,
    /// Recount seeders of a torrent every N seconds.
    #[arg(short = 'c', long, env = "BTUP_MIN_AGE_TO_RECOUNT_SEEDERS", default_value_t = defaults::MIN_RECOUNT_AGE_SECS)]
    pub min_age_to_recount_seeders: u64,
    /// Recount at most N torrents simultaneously.
    #[arg(short = 'P', long, env = "BTUP_MAX_PARALLEL_RECOUNTS", default_value_t = defaults::MAX_PARALLEL_RECOUNTS)]
    pub max_parallel_recounts: usize,
    /// Directory containing torrent definition files.
    #[arg(short = 't', long, env = "BTUP_TORRENTS_DIR", default_value = defaults::TORRENTS_DIR)]
    pub torrents_dir: PathBuf,
    /// Directory containing seeded torrent data.
    #[arg(short = 'D', long, env = "BTUP_DATA_DIR", default_value = defaults::DATA_DIR)]
    pub data_dir: PathBuf,
    /// Directory for temporary recount data [default: /tmp/btup/{PID}].
    #[arg(short = 'T', long, env = "BTUP_TMP_DIR")]
    pub tmp_dir: Option<PathBuf>,
    /// Maximum size of the data directory in GiB.
    #[arg(short = 's', long, env = "BTUP_MAX_DATA_SIZE", default_value_t = defaults::MAX_DATA_SIZE_GIB)]
    pub max_data_size: u64,
    /// File the seeder statistics are persisted to.
    #[arg(long, env = "BTUP_STATS_FILE", default_value = defaults::STATS_FILE)]
    pub stats_file: PathBuf,
    /// Log output format; inferred from the build profile when omitted.
    #[arg(long, env = "BTUP_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormatArg>,
    /// Print status lines for every step of the loop.
    #[arg(short = 'V', long)]
    pub verbose: bool,
    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,
}

/// Log formats accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable output.
    Pretty,
    /// One JSON object per line.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

impl Cli {
    /// Selected log format, falling back to the build-profile default.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.map_or_else(LogFormat::infer, LogFormat::from)
    }

    /// Convert parsed flags into unvalidated configuration input.
    #[must_use]
    pub fn config_input(&self) -> SeederConfigInput {
        SeederConfigInput {
            update_delay_secs: self.update_delay,
            min_seeders_to_ignore: self.min_seeders_to_ignore,
            min_recount_age_secs: self.min_age_to_recount_seeders,
            max_parallel_recounts: self.max_parallel_recounts,
            torrents_dir: self.torrents_dir.clone(),
            data_dir: self.data_dir.clone(),
            scratch_dir: self.tmp_dir.clone().unwrap_or_else(defaults::scratch_dir),
            max_data_size_gib: self.max_data_size,
            stats_file: self.stats_file.clone(),
        }
    }
}
