//! Test fixtures for catalog, data and scratch directories.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tempfile::TempDir;

#[derive(Serialize)]
struct DefinitionInfo<'a> {
    length: u64,
    name: &'a str,
    #[serde(rename = "piece length")]
    piece_length: u64,
    pieces: &'a str,
}

#[derive(Serialize)]
struct Definition<'a> {
    announce: &'a str,
    info: DefinitionInfo<'a>,
}

/// Encode a single-file definition declaring `size` bytes of payload.
///
/// # Errors
///
/// Returns an error if bencoding fails.
pub fn definition_bytes(name: &str, size: u64) -> Result<Vec<u8>> {
    let definition = Definition {
        announce: "udp://tracker.invalid:6969/announce",
        info: DefinitionInfo {
            length: size,
            name,
            piece_length: 16_384,
            pieces: "",
        },
    };
    serde_bencode::to_bytes(&definition).context("failed to bencode definition fixture")
}

/// Temporary catalog tree with `torrents/`, `data/` and `scratch/` folders.
pub struct CatalogFixture {
    root: TempDir,
}

impl CatalogFixture {
    /// Create an empty tree; subdirectories are created lazily.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("btup-fixture-")
            .tempdir()
            .context("failed to create fixture root")?;
        Ok(Self { root })
    }

    /// Root of the fixture tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Catalog directory holding definition files.
    #[must_use]
    pub fn torrents_dir(&self) -> PathBuf {
        self.root.path().join("torrents")
    }

    /// Data directory holding retained payload folders.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    /// Scratch directory used by recount participants.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.path().join("scratch")
    }

    /// Statistics file location inside the fixture.
    #[must_use]
    pub fn stats_path(&self) -> PathBuf {
        self.root.path().join("stats.txt")
    }

    /// Write a definition file named `name` declaring `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn add_definition(&self, name: &str, size: u64) -> Result<PathBuf> {
        let dir = self.torrents_dir();
        fs::create_dir_all(&dir).context("failed to create torrents dir")?;
        let path = dir.join(name);
        fs::write(&path, definition_bytes(name, size)?)
            .with_context(|| format!("failed to write definition {}", path.display()))?;
        Ok(path)
    }

    /// Delete the definition file named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn remove_definition(&self, name: &str) -> Result<()> {
        let path = self.torrents_dir().join(name);
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove definition {}", path.display()))
    }

    /// Create a data folder for `name` containing a small payload file.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder or payload cannot be written.
    pub fn add_payload(&self, name: &str) -> Result<PathBuf> {
        let dir = self.data_dir().join(name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create payload dir {}", dir.display()))?;
        fs::write(dir.join("payload.bin"), b"payload").context("failed to write payload")?;
        Ok(dir)
    }

    /// Create a scratch folder for `name` as a recount participant would.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be created.
    pub fn add_scratch(&self, name: &str) -> Result<PathBuf> {
        let dir = self.scratch_dir().join(name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create scratch dir {}", dir.display()))?;
        Ok(dir)
    }
}
