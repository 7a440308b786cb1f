//! Slow reconciliation pass: catalog scan, data-directory scan and the
//! admission/eviction decision over the disk budget.

use btup_fsops::{DataInventory, reconcile_data_dir, scan_definitions};
use btup_runtime::reconcile_catalog;
use btup_torrent_core::{
    AddTorrent, SeedEngine, Session, SessionRole, SessionToken, TorrentMetainfo,
    UNMEASURED_SEEDERS,
};
use tracing::{debug, info, warn};

use super::Controller;
use crate::error::{AppError, AppResult};

/// Retained payload folder with the scarcity signal used to rank evictions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetainedEntry {
    /// Catalog name.
    pub name: String,
    /// Declared payload size in bytes.
    pub size_bytes: u64,
    /// Seeder count from statistics, unmeasured when the record is missing.
    pub seeder_count: u32,
}

/// Outcome of the eviction-sufficiency search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvictionPlan {
    /// Deleting `names` frees `freed_bytes`, enough to admit the candidate.
    Evict {
        /// Folders to delete, most-seeded first.
        names: Vec<String>,
        /// Sum of their declared sizes.
        freed_bytes: u64,
    },
    /// No set of more abundant folders frees enough space.
    Infeasible,
}

/// Decide which retained folders to delete so a candidate fits.
///
/// `retained` must be sorted by ascending seeder count. The walk starts at
/// the most-seeded entry and stops as soon as the budget is met, or fails on
/// reaching an entry that is no more abundant than the candidate.
#[must_use]
pub fn plan_eviction(
    retained: &[RetainedEntry],
    candidate_seeders: u32,
    occupied: u64,
    candidate_size: u64,
    capacity: u64,
) -> EvictionPlan {
    let mut names = Vec::new();
    let mut freed_bytes = 0_u64;
    for entry in retained.iter().rev() {
        if entry.seeder_count <= candidate_seeders {
            return EvictionPlan::Infeasible;
        }
        freed_bytes = freed_bytes.saturating_add(entry.size_bytes);
        names.push(entry.name.clone());
        if occupied
            .saturating_sub(freed_bytes)
            .saturating_add(candidate_size)
            <= capacity
        {
            return EvictionPlan::Evict { names, freed_bytes };
        }
    }
    EvictionPlan::Infeasible
}

/// What one admission pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionReport {
    /// Items whose seeding session was started.
    pub started: Vec<String>,
    /// Items whose seeding session was stopped.
    pub stopped: Vec<String>,
    /// Retained folders deleted to make room.
    pub evicted: Vec<String>,
    /// Records dropped because the item cannot be seeded.
    pub unregistered: Vec<String>,
    /// Occupied bytes after the pass.
    pub occupied_bytes: u64,
}

struct Budget {
    retained: Vec<RetainedEntry>,
    occupied: u64,
    capacity: u64,
}

impl Budget {
    fn holds(&self, name: &str) -> bool {
        self.retained.iter().any(|entry| entry.name == name)
    }

    fn add(&mut self, entry: RetainedEntry) {
        self.occupied = self.occupied.saturating_add(entry.size_bytes);
        let idx = self
            .retained
            .partition_point(|existing| existing.seeder_count <= entry.seeder_count);
        self.retained.insert(idx, entry);
    }

    fn release(&mut self, names: &[String], freed_bytes: u64) {
        self.retained.retain(|entry| !names.contains(&entry.name));
        self.occupied = self.occupied.saturating_sub(freed_bytes);
    }
}

impl<E> Controller<E>
where
    E: SeedEngine,
{
    /// Run the slow pass: reconcile catalog and data, then admit or evict.
    ///
    /// # Errors
    ///
    /// Returns an error when a directory cannot be scanned or pruned.
    pub async fn update(&mut self, now: u64) -> AppResult<AdmissionReport> {
        debug!("periodic update started");
        let definitions = scan_definitions(&self.layout)
            .map_err(|err| AppError::fsops("update.scan_definitions", err))?;
        reconcile_catalog(&mut self.stats, &definitions);
        for token in self.unrecorded_seeders() {
            self.stop_seeding(token).await;
        }

        let inventory = reconcile_data_dir(&self.layout)
            .map_err(|err| AppError::fsops("update.reconcile_data_dir", err))?;
        self.admit(&inventory, now).await
    }

    /// Walk the catalog by ascending seeder count and decide who seeds.
    ///
    /// # Errors
    ///
    /// Returns an error when an evicted folder cannot be deleted.
    pub async fn admit(&mut self, inventory: &DataInventory, now: u64) -> AppResult<AdmissionReport> {
        debug!("checking the seeding list");
        let threshold = self.config.min_seeders_to_ignore;
        let mut retained: Vec<RetainedEntry> = inventory
            .retained
            .iter()
            .map(|data| RetainedEntry {
                name: data.name.clone(),
                size_bytes: data.size_bytes,
                seeder_count: self.recorded_seeders(&data.name),
            })
            .collect();
        retained.sort_by_key(|entry| entry.seeder_count);
        let mut budget = Budget {
            retained,
            occupied: inventory.total_bytes,
            capacity: self.config.capacity_bytes,
        };
        self.charge_seeding_without_data(&mut budget);
        let mut report = AdmissionReport::default();

        for (name, record) in self.stats.by_ascending_seeders() {
            let seeding = self.seeding_token(&name);
            let cutoff = if seeding.is_some() {
                threshold.saturating_add(1)
            } else {
                threshold
            };

            if record.seeder_count >= cutoff {
                // Nothing past this point is admitted; keep walking only to stop
                // seeders that are now above their own cutoff.
                if let Some(token) = seeding {
                    info!(torrent = %name, seeders = record.seeder_count, "seeder count above threshold");
                    self.stop_seeding(token).await;
                    report.stopped.push(name);
                }
                continue;
            }
            if seeding.is_some() {
                continue;
            }

            self.try_admit(&name, record.seeder_count, &mut budget, now, &mut report)
                .await?;
        }

        report.occupied_bytes = budget.occupied;
        if !report.started.is_empty() || !report.stopped.is_empty() || !report.unregistered.is_empty() {
            info!(
                started = report.started.len(),
                stopped = report.stopped.len(),
                evicted = report.evicted.len(),
                unregistered = report.unregistered.len(),
                seeding = self.seeding.len(),
                occupied_bytes = budget.occupied,
                "admission pass complete"
            );
        }
        Ok(report)
    }

    /// Seeding sessions count against the budget even before their payload
    /// folder appears on disk.
    fn charge_seeding_without_data(&self, budget: &mut Budget) {
        let mut uncounted: Vec<&str> = self
            .seeding
            .values()
            .map(|session| session.name.as_str())
            .filter(|name| !budget.holds(name))
            .collect();
        uncounted.sort_unstable();
        for name in uncounted {
            match TorrentMetainfo::read_total_size(&self.layout.definition_path(name)) {
                Ok(size_bytes) => budget.add(RetainedEntry {
                    name: name.to_string(),
                    size_bytes,
                    seeder_count: self.recorded_seeders(name),
                }),
                Err(err) => {
                    warn!(torrent = %name, error = ?err, "seeding item has no readable size; left out of the budget");
                }
            }
        }
    }

    fn recorded_seeders(&self, name: &str) -> u32 {
        self.stats
            .get(name)
            .map_or(UNMEASURED_SEEDERS, |record| record.seeder_count)
    }

    fn unrecorded_seeders(&self) -> Vec<SessionToken> {
        self.seeding
            .values()
            .filter(|session| !self.stats.contains(&session.name))
            .map(|session| session.token)
            .collect()
    }

    async fn try_admit(
        &mut self,
        name: &str,
        seeders: u32,
        budget: &mut Budget,
        now: u64,
        report: &mut AdmissionReport,
    ) -> AppResult<()> {
        let size = match TorrentMetainfo::read_total_size(&self.layout.definition_path(name)) {
            Ok(size) => size,
            Err(err) => {
                warn!(torrent = %name, error = ?err, "definition unusable; unregistering");
                self.unregister(name, report);
                return Ok(());
            }
        };
        let has_data = budget.holds(name);
        let needed = if has_data { 0 } else { size };

        if budget.occupied.saturating_add(needed) > budget.capacity {
            info!(
                torrent = %name,
                needed,
                occupied = budget.occupied,
                capacity = budget.capacity,
                "data directory too large; looking for less important data"
            );
            match plan_eviction(&budget.retained, seeders, budget.occupied, needed, budget.capacity) {
                EvictionPlan::Infeasible => {
                    info!(torrent = %name, "not enough less important data to free; unregistering");
                    self.unregister(name, report);
                    return Ok(());
                }
                EvictionPlan::Evict { names, freed_bytes } => {
                    for victim in &names {
                        if let Some(token) = self.seeding_token(victim) {
                            self.stop_seeding(token).await;
                            report.stopped.push(victim.clone());
                        }
                        self.layout
                            .remove_data(victim)
                            .map_err(|err| AppError::fsops("admission.evict", err))?;
                        info!(torrent = %victim, "deleted retained data");
                    }
                    budget.release(&names, freed_bytes);
                    report.evicted.extend(names);
                }
            }
        }

        if self.start_seeding(name, seeders, now).await {
            if !has_data {
                budget.add(RetainedEntry {
                    name: name.to_string(),
                    size_bytes: size,
                    seeder_count: seeders,
                });
            }
            report.started.push(name.to_string());
        }
        Ok(())
    }

    async fn start_seeding(&mut self, name: &str, seeders: u32, now: u64) -> bool {
        let session = Session::new(name, SessionRole::Seeding, now);
        let token = session.token;
        let request = AddTorrent {
            token,
            name: name.to_string(),
            definition: self.layout.definition_path(name),
            save_path: self.layout.data_path(name),
            download_limit_bps: None,
        };
        info!(torrent = %name, seeders, "attempting to start seeding");
        match self.engine.add_torrent(request).await {
            Ok(()) => {
                self.seeding.insert(token, session);
                true
            }
            Err(err) => {
                warn!(torrent = %name, error = %err, "engine rejected seeding add");
                false
            }
        }
    }

    fn unregister(&mut self, name: &str, report: &mut AdmissionReport) {
        if self.stats.remove(name).is_some() {
            report.unregistered.push(name.to_string());
        }
    }
}
