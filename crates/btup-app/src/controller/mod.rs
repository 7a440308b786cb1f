//! The seeding controller: one value owning the statistics store, both
//! session maps, the directory layout and the engine handle.
//!
//! Every operation takes the current Unix time explicitly and mutates state
//! serially; the orchestrator decides when each one runs.

mod admission;
mod alerts;
mod recount;

pub use admission::{AdmissionReport, EvictionPlan, RetainedEntry, plan_eviction};

use std::collections::HashMap;

use btup_config::SeederConfig;
use btup_fsops::CatalogLayout;
use btup_runtime::StatsStore;
use btup_torrent_core::{SeedEngine, Session, SessionToken};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Admission, recount and alert reconciliation state.
pub struct Controller<E> {
    config: SeederConfig,
    layout: CatalogLayout,
    stats: StatsStore,
    engine: E,
    seeding: HashMap<SessionToken, Session>,
    recounting: HashMap<SessionToken, Session>,
}

impl<E> Controller<E>
where
    E: SeedEngine,
{
    /// Build a controller over an already loaded statistics store.
    #[must_use]
    pub fn new(config: SeederConfig, stats: StatsStore, engine: E) -> Self {
        let layout = CatalogLayout::new(
            config.torrents_dir.clone(),
            config.data_dir.clone(),
            config.scratch_dir.clone(),
        );
        Self {
            config,
            layout,
            stats,
            engine,
            seeding: HashMap::new(),
            recounting: HashMap::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SeederConfig {
        &self.config
    }

    /// Directory layout derived from the configuration.
    #[must_use]
    pub const fn layout(&self) -> &CatalogLayout {
        &self.layout
    }

    /// Seeder statistics.
    #[must_use]
    pub const fn stats(&self) -> &StatsStore {
        &self.stats
    }

    /// Mutable access to the statistics, for seeding state in tests and tools.
    pub const fn stats_mut(&mut self) -> &mut StatsStore {
        &mut self.stats
    }

    /// Engine handle.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Mutable engine handle.
    pub const fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Sessions currently seeding.
    pub fn seeding(&self) -> impl Iterator<Item = &Session> {
        self.seeding.values()
    }

    /// Sessions currently recounting.
    pub fn recounting(&self) -> impl Iterator<Item = &Session> {
        self.recounting.values()
    }

    /// Whether `name` has a seeding session.
    #[must_use]
    pub fn is_seeding(&self, name: &str) -> bool {
        self.seeding_token(name).is_some()
    }

    /// Whether `name` has a recounting session.
    #[must_use]
    pub fn is_recounting(&self, name: &str) -> bool {
        self.recounting.values().any(|session| session.name == name)
    }

    fn seeding_token(&self, name: &str) -> Option<SessionToken> {
        self.seeding
            .values()
            .find(|session| session.name == name)
            .map(|session| session.token)
    }

    /// Flush statistics when dirty and the flush interval has elapsed.
    ///
    /// # Errors
    ///
    /// Returns an error when the statistics file cannot be rewritten.
    pub fn flush_stats_if_due(&mut self, now: u64) -> AppResult<bool> {
        self.stats
            .flush_if_due(now)
            .map_err(|err| AppError::runtime("stats.flush_if_due", err))
    }

    /// Remove every live participant, persist statistics and purge scratch.
    ///
    /// # Errors
    ///
    /// Returns an error when statistics cannot be written or scratch cannot
    /// be purged. Engine failures are logged only.
    pub async fn shutdown(&mut self, now: u64) -> AppResult<()> {
        info!(
            seeding = self.seeding.len(),
            recounting = self.recounting.len(),
            "shutting down controller"
        );
        let seeding: Vec<SessionToken> = self.seeding.keys().copied().collect();
        for token in seeding {
            self.stop_seeding(token).await;
        }
        let recounting: Vec<Session> = self.recounting.drain().map(|(_, session)| session).collect();
        for session in recounting {
            self.retire_recount(&session).await;
        }

        if self.stats.is_dirty() {
            self.stats
                .flush(now)
                .map_err(|err| AppError::runtime("stats.flush", err))?;
        }
        self.layout
            .purge_scratch()
            .map_err(|err| AppError::fsops("shutdown.purge_scratch", err))
    }

    async fn stop_seeding(&mut self, token: SessionToken) {
        let Some(session) = self.seeding.remove(&token) else {
            return;
        };
        if let Err(err) = self.engine.remove_torrent(token).await {
            warn!(torrent = %session.name, %token, error = %err, "engine refused to remove seeding participant");
        }
        info!(
            torrent = %session.name,
            seeding = self.seeding.len(),
            "stopped seeding"
        );
    }

    async fn retire_recount(&mut self, session: &Session) {
        if let Err(err) = self.engine.remove_torrent(session.token).await {
            warn!(torrent = %session.name, token = %session.token, error = %err, "engine refused to remove recount participant");
        }
        if let Err(err) = self.layout.remove_scratch(&session.name) {
            warn!(torrent = %session.name, error = ?err, "failed to delete recount scratch data");
        }
    }
}
