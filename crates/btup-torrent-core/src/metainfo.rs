//! Minimal reader for bencoded torrent definition files.
//!
//! Only the declared total size is decoded. Piece hashes, names and tracker
//! lists are left to the engine.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{TorrentError, TorrentResult};

/// Metadata extracted from a definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentMetainfo {
    /// Sum of all file lengths in bytes.
    pub total_size: u64,
}

#[derive(Deserialize)]
struct RawMetainfo {
    info: RawInfo,
}

#[derive(Deserialize)]
struct RawInfo {
    #[serde(default)]
    length: Option<u64>,
    #[serde(default)]
    files: Option<Vec<RawFile>>,
}

#[derive(Deserialize)]
struct RawFile {
    length: u64,
}

impl TorrentMetainfo {
    /// Read and decode a definition from disk.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, is not bencoded
    /// metainfo, or declares neither a single length nor a file list.
    pub fn read(path: &Path) -> TorrentResult<Self> {
        let bytes = fs::read(path).map_err(|source| TorrentError::Io {
            operation: "metainfo.read",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, &bytes)
    }

    /// Decode a definition already loaded into memory.
    ///
    /// # Errors
    ///
    /// Returns an error when the payload is not valid metainfo.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> TorrentResult<Self> {
        let raw: RawMetainfo =
            serde_bencode::from_bytes(bytes).map_err(|source| TorrentError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        let total_size = match (raw.info.length, raw.info.files) {
            (Some(length), _) => length,
            (None, Some(files)) => files
                .iter()
                .try_fold(0_u64, |acc, file| acc.checked_add(file.length))
                .ok_or_else(|| TorrentError::InvalidDefinition {
                    path: path.to_path_buf(),
                    reason: "total_size_overflow",
                })?,
            (None, None) => {
                return Err(TorrentError::InvalidDefinition {
                    path: path.to_path_buf(),
                    reason: "missing_length",
                });
            }
        };

        Ok(Self { total_size })
    }

    /// Convenience wrapper returning only the declared size.
    ///
    /// # Errors
    ///
    /// Propagates any failure from [`TorrentMetainfo::read`].
    pub fn read_total_size(path: &Path) -> TorrentResult<u64> {
        Self::read(path).map(|info| info.total_size)
    }
}
