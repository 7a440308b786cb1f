//! Definition scanning and data-directory reconciliation.
//!
//! The data inventory produced here is the authoritative space accounting
//! consumed by admission.

use std::collections::BTreeSet;
use std::path::Path;

use btup_torrent_core::TorrentMetainfo;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{FsOpsError, FsOpsResult};
use crate::layout::{CatalogLayout, ensure_dir, remove_tree};

/// A retained payload folder and the size its definition declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedData {
    /// Catalog name (folder name).
    pub name: String,
    /// Declared payload size in bytes.
    pub size_bytes: u64,
}

/// Result of a data-directory reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataInventory {
    /// Folders kept because their definition still exists.
    pub retained: Vec<RetainedData>,
    /// Sum of the retained sizes.
    pub total_bytes: u64,
    /// Folders deleted because their definition disappeared.
    pub purged: Vec<String>,
}

/// List the immediate non-directory entries of the catalog directory.
///
/// The directory is created when missing.
///
/// # Errors
///
/// Returns an error when the directory cannot be created or read.
pub fn scan_definitions(layout: &CatalogLayout) -> FsOpsResult<BTreeSet<String>> {
    let dir = layout.torrents_dir();
    ensure_dir("scan_definitions.create", dir)?;
    let mut names = BTreeSet::new();
    for entry in immediate_children("scan_definitions.walk", dir)? {
        if entry.file_type().is_dir() {
            continue;
        }
        if let Some(name) = entry_name(&entry) {
            names.insert(name);
        }
    }
    debug!(count = names.len(), "definitions scanned");
    Ok(names)
}

/// Delete orphaned payload folders and account for the rest.
///
/// A folder whose definition exists but cannot be parsed is left on disk and
/// accounted at its measured on-disk size until the definition becomes
/// readable.
///
/// # Errors
///
/// Returns an error when the data directory cannot be created, read or
/// pruned.
pub fn reconcile_data_dir(layout: &CatalogLayout) -> FsOpsResult<DataInventory> {
    let dir = layout.data_dir();
    ensure_dir("reconcile_data_dir.create", dir)?;
    let mut inventory = DataInventory::default();

    for entry in immediate_children("reconcile_data_dir.walk", dir)? {
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry_name(&entry) else {
            continue;
        };

        if !layout.definition_exists(&name)? {
            info!(torrent = %name, "definition missing; deleting retained data");
            remove_tree("reconcile_data_dir.remove", entry.path())?;
            inventory.purged.push(name);
            continue;
        }

        match TorrentMetainfo::read_total_size(&layout.definition_path(&name)) {
            Ok(size_bytes) => {
                inventory.total_bytes = inventory.total_bytes.saturating_add(size_bytes);
                inventory.retained.push(RetainedData { name, size_bytes });
            }
            Err(err) => {
                let size_bytes = folder_bytes("reconcile_data_dir.measure", entry.path())?;
                warn!(
                    torrent = %name,
                    error = %err,
                    size_bytes,
                    "definition unreadable; accounting retained data by its on-disk size"
                );
                inventory.total_bytes = inventory.total_bytes.saturating_add(size_bytes);
                inventory.retained.push(RetainedData { name, size_bytes });
            }
        }
    }

    if !inventory.purged.is_empty() {
        info!(
            purged = inventory.purged.len(),
            retained_gib = gib(inventory.total_bytes),
            "purged data of deleted torrents"
        );
    }
    Ok(inventory)
}

fn immediate_children(operation: &'static str, dir: &Path) -> FsOpsResult<Vec<DirEntry>> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.map_err(|source| FsOpsError::walkdir(operation, dir, source)))
        .collect()
}

fn folder_bytes(operation: &'static str, path: &Path) -> FsOpsResult<u64> {
    let mut total = 0_u64;
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.map_err(|source| FsOpsError::walkdir(operation, path, source))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry
            .metadata()
            .map_err(|source| FsOpsError::walkdir(operation, entry.path(), source))?;
        total = total.saturating_add(metadata.len());
    }
    Ok(total)
}

fn entry_name(entry: &DirEntry) -> Option<String> {
    let name = entry.file_name().to_str().map(str::to_owned);
    if name.is_none() {
        warn!(path = %entry.path().display(), "skipping entry with non UTF-8 name");
    }
    name
}

#[allow(clippy::cast_precision_loss)]
fn gib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0 / 1024.0
}
