//! Error types for the statistics store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for statistics operations.
pub type StatsResult<T> = Result<T, StatsError>;

/// Failures raised while loading, parsing or persisting statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Filesystem access failed.
    #[error("stats io failure")]
    Io {
        /// Operation being performed.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The temporary file could not replace the statistics file.
    #[error("stats persist failure")]
    Persist {
        /// Destination path.
        path: PathBuf,
        /// Underlying persist error.
        source: tempfile::PersistError,
    },
    /// A persisted line did not have the expected shape.
    #[error("malformed stats line")]
    MalformedLine {
        /// One-based line number.
        line: usize,
        /// Static reason for rejection.
        reason: &'static str,
    },
}

impl StatsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
