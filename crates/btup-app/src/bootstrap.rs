use std::future::Future;

use btup_config::{SeederConfig, validate};
use btup_runtime::StatsStore;
use btup_telemetry::{GlobalContextGuard, LoggingConfig};
use btup_torrent_core::{EngineSettings, SeedEngine};
use btup_torrent_sim::SimulatedEngine;
use clap::Parser;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::controller::Controller;
use crate::error::{AppError, AppResult};
use crate::orchestrator::Orchestrator;

/// Parse the command line, install logging and run the controller until
/// Ctrl-C.
///
/// # Errors
///
/// Returns an error when configuration is invalid, logging cannot be
/// installed, or the controller loop fails.
pub async fn run_app() -> AppResult<()> {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        format: cli.log_format(),
        ..LoggingConfig::for_verbosity(cli.verbose)
    };
    btup_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init_logging", err))?;
    let _context = GlobalContextGuard::new("seeding");

    let config =
        validate(cli.config_input()).map_err(|err| AppError::config("config.validate", err))?;
    info!(
        torrents_dir = %config.torrents_dir.display(),
        data_dir = %config.data_dir.display(),
        scratch_dir = %config.scratch_dir.display(),
        capacity_bytes = config.capacity_bytes,
        min_seeders_to_ignore = config.min_seeders_to_ignore,
        "configuration loaded"
    );

    warn!("no native transfer engine linked; running against the simulated engine");
    run_seeder(config, SimulatedEngine::new(), shutdown_signal()).await
}

/// Load statistics, prepare the engine and drive the controller until
/// `shutdown` resolves.
///
/// # Errors
///
/// Returns an error when statistics cannot be loaded, the scratch directory
/// cannot be prepared, the engine rejects its settings, or the loop fails.
pub async fn run_seeder<E, F>(config: SeederConfig, mut engine: E, shutdown: F) -> AppResult<()>
where
    E: SeedEngine,
    F: Future<Output = ()>,
{
    let stats = StatsStore::load(config.stats_file.clone())
        .map_err(|err| AppError::runtime("stats.load", err))?;

    engine
        .apply_settings(EngineSettings::default())
        .await
        .map_err(|err| AppError::engine("engine.apply_settings", err))?;

    let controller = Controller::new(config, stats, engine);
    controller
        .layout()
        .purge_scratch()
        .map_err(|err| AppError::fsops("startup.purge_scratch", err))?;

    Orchestrator::new(controller).run_until(shutdown).await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
