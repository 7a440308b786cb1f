//! Engine boundary implemented by transfer-engine adapters.

use crate::model::{AddTorrent, EngineAlert, EngineSettings, SessionToken, TorrentSnapshot};
use anyhow::bail;
use async_trait::async_trait;

/// Commands and alert polling consumed by the seeding controller.
///
/// Every command returns as soon as it is queued; outcomes surface later
/// through [`SeedEngine::poll_alerts`].
#[async_trait]
pub trait SeedEngine: Send {
    /// Apply session-wide settings; default implementation reports lack of support.
    async fn apply_settings(&mut self, settings: EngineSettings) -> anyhow::Result<()> {
        let _ = settings;
        bail!("session settings not supported by this engine");
    }

    /// Queue an asynchronous add of a participant.
    async fn add_torrent(&mut self, request: AddTorrent) -> anyhow::Result<()>;

    /// Remove a participant, keeping its on-disk data.
    async fn remove_torrent(&mut self, token: SessionToken) -> anyhow::Result<()>;

    /// Ask the participant's trackers for a fresh seeder count.
    async fn scrape(&mut self, token: SessionToken) -> anyhow::Result<()>;

    /// Current status of a participant, `None` when the engine does not know it.
    async fn status(&mut self, token: SessionToken) -> anyhow::Result<Option<TorrentSnapshot>>;

    /// Drain every alert buffered since the previous call.
    async fn poll_alerts(&mut self) -> anyhow::Result<Vec<EngineAlert>>;
}
