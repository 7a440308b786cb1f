//! Catalog reconciliation: align tracked records with definitions on disk.

use std::collections::BTreeSet;

use btup_torrent_core::TorrentRecord;
use tracing::info;

use crate::store::StatsStore;

/// Names added and removed by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDelta {
    /// Definitions that had no record and were registered as unmeasured.
    pub discovered: Vec<String>,
    /// Records whose definition disappeared.
    pub unregistered: Vec<String>,
}

impl CatalogDelta {
    /// Whether the pass changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty() && self.unregistered.is_empty()
    }
}

/// Keep exactly the records whose definition exists and register newcomers.
pub fn reconcile_catalog(store: &mut StatsStore, definitions: &BTreeSet<String>) -> CatalogDelta {
    let mut delta = CatalogDelta::default();

    let stale: Vec<String> = store
        .iter()
        .filter(|(name, _)| !definitions.contains(*name))
        .map(|(name, _)| name.to_string())
        .collect();
    for name in stale {
        store.remove(&name);
        delta.unregistered.push(name);
    }

    for name in definitions {
        if !store.contains(name) {
            store.insert(name.clone(), TorrentRecord::discovered());
            delta.discovered.push(name.clone());
        }
    }

    if !delta.is_empty() {
        info!(
            discovered = delta.discovered.len(),
            unregistered = delta.unregistered.len(),
            tracked = store.len(),
            "catalog reconciled"
        );
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn newcomers_are_unmeasured_and_stale_records_drop() {
        let mut store = StatsStore::new("unused");
        store.insert("old", TorrentRecord::measured(10, 2));
        store.insert("kept", TorrentRecord::measured(10, 3));

        let delta = reconcile_catalog(&mut store, &names(&["kept", "fresh"]));
        assert_eq!(delta.discovered, vec!["fresh".to_string()]);
        assert_eq!(delta.unregistered, vec!["old".to_string()]);
        assert_eq!(store.get("fresh"), Some(&TorrentRecord::discovered()));
        assert_eq!(store.get("kept"), Some(&TorrentRecord::measured(10, 3)));
        assert!(!store.contains("old"));
    }

    #[test]
    fn unchanged_catalog_leaves_store_clean() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let mut store = StatsStore::new(dir.path().join("stats.txt"));
        store.insert("a", TorrentRecord::discovered());
        store.flush(0)?;

        let delta = reconcile_catalog(&mut store, &names(&["a"]));
        assert!(delta.is_empty());
        assert!(!store.is_dirty());
        Ok(())
    }
}
