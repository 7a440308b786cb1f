//! Error types for torrent core services.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for torrent definition handling.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// The definition file could not be read.
    #[error("torrent definition io failure")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Definition path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The definition file was not valid bencoded metainfo.
    #[error("torrent definition decode failure")]
    Decode {
        /// Definition path involved in the failure.
        path: PathBuf,
        /// Underlying bencode error.
        source: serde_bencode::Error,
    },
    /// The definition decoded but its content is unusable.
    #[error("torrent definition invalid")]
    InvalidDefinition {
        /// Definition path involved in the failure.
        path: PathBuf,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for torrent operation results.
pub type TorrentResult<T> = Result<T, TorrentError>;
