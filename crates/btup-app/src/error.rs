//! # Design
//!
//! - Centralize application-level errors for bootstrap and the controller loop.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration validation failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: btup_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: btup_telemetry::TelemetryError,
    },
    /// Catalog or data directory operations failed.
    #[error("filesystem operation failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: btup_fsops::FsOpsError,
    },
    /// Statistics persistence failed.
    #[error("statistics persistence failed")]
    Runtime {
        /// Operation identifier.
        operation: &'static str,
        /// Source statistics error.
        source: btup_runtime::StatsError,
    },
    /// The transfer engine rejected a startup command.
    #[error("engine operation failed")]
    Engine {
        /// Operation identifier.
        operation: &'static str,
        /// Source engine error.
        source: anyhow::Error,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: btup_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: btup_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: btup_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) const fn runtime(operation: &'static str, source: btup_runtime::StatsError) -> Self {
        Self::Runtime { operation, source }
    }

    pub(crate) const fn engine(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Engine { operation, source }
    }
}
