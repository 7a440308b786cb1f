//! Directory layout shared by the scanners and the controller.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{FsOpsError, FsOpsResult};

/// The three directories the controller works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLayout {
    torrents_dir: PathBuf,
    data_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl CatalogLayout {
    /// Build a layout from its three roots.
    #[must_use]
    pub fn new(
        torrents_dir: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            torrents_dir: torrents_dir.into(),
            data_dir: data_dir.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Directory holding definition files.
    #[must_use]
    pub fn torrents_dir(&self) -> &Path {
        &self.torrents_dir
    }

    /// Directory holding retained payload folders.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding recount scratch folders.
    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Definition file for `name`.
    #[must_use]
    pub fn definition_path(&self, name: &str) -> PathBuf {
        self.torrents_dir.join(name)
    }

    /// Retained payload folder for `name`.
    #[must_use]
    pub fn data_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Scratch folder used while recounting `name`.
    #[must_use]
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch_dir.join(name)
    }

    /// Whether the definition for `name` is still present.
    ///
    /// # Errors
    ///
    /// Returns an error when existence cannot be determined.
    pub fn definition_exists(&self, name: &str) -> FsOpsResult<bool> {
        let path = self.definition_path(name);
        path.try_exists()
            .map_err(|source| FsOpsError::io("layout.definition_exists", path, source))
    }

    /// Delete the retained payload folder for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when the folder exists but cannot be removed.
    pub fn remove_data(&self, name: &str) -> FsOpsResult<()> {
        remove_tree("layout.remove_data", &self.data_path(name))
    }

    /// Delete the scratch folder for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when the folder exists but cannot be removed.
    pub fn remove_scratch(&self, name: &str) -> FsOpsResult<()> {
        remove_tree("layout.remove_scratch", &self.scratch_path(name))
    }

    /// Delete the whole scratch directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory exists but cannot be removed.
    pub fn purge_scratch(&self) -> FsOpsResult<()> {
        remove_tree("layout.purge_scratch", &self.scratch_dir)?;
        info!(path = %self.scratch_dir.display(), "scratch directory purged");
        Ok(())
    }
}

pub(crate) fn ensure_dir(operation: &'static str, path: &Path) -> FsOpsResult<()> {
    fs::create_dir_all(path).map_err(|source| FsOpsError::io(operation, path, source))
}

pub(crate) fn remove_tree(operation: &'static str, path: &Path) -> FsOpsResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FsOpsError::io(operation, path, source)),
    }
}
