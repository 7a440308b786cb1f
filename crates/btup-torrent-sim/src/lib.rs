#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! Simulated transfer engine implementing [`SeedEngine`] in-process.
//!
//! Adds are confirmed on the next alert poll, scrapes answer from a per-name
//! swarm table, and every command is recorded so callers can assert on the
//! exact traffic the controller generated. Names without a configured swarm
//! never answer scrapes, which exercises the recount timeout path.

/// Command records kept by the simulated engine.
pub mod command;

pub use command::EngineCommand;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use btup_torrent_core::{
    AddTorrent, EngineAlert, EngineSettings, SeedEngine, SessionToken, TorrentSnapshot,
};
use tracing::debug;

/// Simulated swarm behaviour for one catalog name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwarmProfile {
    /// Raw `complete` value returned by scrapes, `None` when trackers stay silent.
    pub scrape_complete: Option<i64>,
    /// Seeds reported through participant status.
    pub known_peers: u32,
}

impl SwarmProfile {
    /// Swarm whose trackers answer with `complete` seeders.
    #[must_use]
    pub const fn answering(complete: i64, known_peers: u32) -> Self {
        Self {
            scrape_complete: Some(complete),
            known_peers,
        }
    }

    /// Swarm whose trackers never answer.
    #[must_use]
    pub const fn silent(known_peers: u32) -> Self {
        Self {
            scrape_complete: None,
            known_peers,
        }
    }
}

#[derive(Debug, Clone)]
struct SimTorrent {
    name: String,
    save_path: PathBuf,
}

/// In-memory engine double.
#[derive(Debug, Default)]
pub struct SimulatedEngine {
    torrents: HashMap<SessionToken, SimTorrent>,
    swarms: HashMap<String, SwarmProfile>,
    pending_alerts: Vec<EngineAlert>,
    commands: Vec<EngineCommand>,
}

impl SimulatedEngine {
    /// Create an engine with no configured swarms.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure how the swarm for `name` behaves.
    #[must_use]
    pub fn with_swarm(mut self, name: impl Into<String>, profile: SwarmProfile) -> Self {
        self.set_swarm(name, profile);
        self
    }

    /// Replace the swarm profile for `name`.
    pub fn set_swarm(&mut self, name: impl Into<String>, profile: SwarmProfile) {
        self.swarms.insert(name.into(), profile);
    }

    /// Queue an alert as if the engine produced it.
    pub fn inject_alert(&mut self, alert: EngineAlert) {
        self.pending_alerts.push(alert);
    }

    /// Commands received so far.
    #[must_use]
    pub fn commands(&self) -> &[EngineCommand] {
        &self.commands
    }

    /// Drain the command log.
    pub fn take_commands(&mut self) -> Vec<EngineCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of participants currently inside the engine.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.torrents.len()
    }

    fn swarm(&self, name: &str) -> SwarmProfile {
        self.swarms.get(name).copied().unwrap_or_default()
    }

    fn snapshot(&self, torrent: &SimTorrent) -> TorrentSnapshot {
        TorrentSnapshot {
            known_peers: self.swarm(&torrent.name).known_peers,
            has_complete_copy: has_payload(&torrent.save_path),
        }
    }
}

fn has_payload(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[async_trait]
impl SeedEngine for SimulatedEngine {
    async fn apply_settings(&mut self, settings: EngineSettings) -> Result<()> {
        debug!(?settings, "simulated settings applied");
        self.commands.push(EngineCommand::ApplySettings(settings));
        Ok(())
    }

    async fn add_torrent(&mut self, request: AddTorrent) -> Result<()> {
        if self.torrents.contains_key(&request.token) {
            return Err(anyhow!("duplicate participant {}", request.token));
        }
        self.commands.push(EngineCommand::Add {
            token: request.token,
            name: request.name.clone(),
            save_path: request.save_path.clone(),
            download_limit_bps: request.download_limit_bps,
        });
        let torrent = SimTorrent {
            name: request.name,
            save_path: request.save_path,
        };
        let status = self.snapshot(&torrent);
        debug!(token = %request.token, name = %torrent.name, "simulated add queued");
        self.torrents.insert(request.token, torrent);
        self.pending_alerts.push(EngineAlert::AddConfirmed {
            token: Some(request.token),
            status,
        });
        Ok(())
    }

    async fn remove_torrent(&mut self, token: SessionToken) -> Result<()> {
        self.commands.push(EngineCommand::Remove { token });
        if self.torrents.remove(&token).is_some() {
            Ok(())
        } else {
            Err(anyhow!("unknown participant {token} for remove command"))
        }
    }

    async fn scrape(&mut self, token: SessionToken) -> Result<()> {
        self.commands.push(EngineCommand::Scrape { token });
        let torrent = self
            .torrents
            .get(&token)
            .ok_or_else(|| anyhow!("unknown participant {token} for scrape"))?;
        if let Some(complete) = self.swarm(&torrent.name).scrape_complete {
            self.pending_alerts.push(EngineAlert::ScrapeReply {
                token: Some(token),
                complete,
            });
        }
        Ok(())
    }

    async fn status(&mut self, token: SessionToken) -> Result<Option<TorrentSnapshot>> {
        Ok(self.torrents.get(&token).map(|torrent| self.snapshot(torrent)))
    }

    async fn poll_alerts(&mut self) -> Result<Vec<EngineAlert>> {
        Ok(std::mem::take(&mut self.pending_alerts))
    }
}
