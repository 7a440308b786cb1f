//! Routing of engine alerts back to the session that caused them.

use btup_torrent_core::{
    EngineAlert, SeedEngine, SessionRole, SessionToken, TorrentSnapshot, seeders_from_scrape,
};
use tracing::{debug, info, trace, warn};

use super::Controller;

impl<E> Controller<E>
where
    E: SeedEngine,
{
    /// Drain the engine's alert queue and apply each alert. Returns the number
    /// of alerts drained.
    pub async fn reconcile_alerts(&mut self, now: u64) -> usize {
        debug!("processing engine alerts");
        let alerts = match self.engine.poll_alerts().await {
            Ok(alerts) => alerts,
            Err(err) => {
                warn!(error = %err, "failed to poll engine alerts");
                return 0;
            }
        };
        let drained = alerts.len();
        for alert in alerts {
            self.handle_alert(alert, now).await;
        }
        drained
    }

    fn role_of(&self, token: SessionToken) -> Option<SessionRole> {
        self.seeding
            .get(&token)
            .or_else(|| self.recounting.get(&token))
            .map(|session| session.role)
    }

    async fn handle_alert(&mut self, alert: EngineAlert, now: u64) {
        let Some(token) = alert.token() else {
            trace!(?alert, "alert for a participant no longer in the engine");
            return;
        };
        let Some(role) = self.role_of(token) else {
            warn!(%token, "alert for unknown participant; removing it");
            if let Err(err) = self.engine.remove_torrent(token).await {
                warn!(%token, error = %err, "failed to remove stray participant");
            }
            return;
        };
        trace!(%token, role = role.as_str(), ?alert, "routing engine alert");

        match (alert, role) {
            (EngineAlert::AddConfirmed { .. }, SessionRole::Recounting) => {
                if let Err(err) = self.engine.scrape(token).await {
                    warn!(%token, error = %err, "failed to request scrape");
                }
            }
            (EngineAlert::AddConfirmed { status, .. }, SessionRole::Seeding) => {
                self.confirm_seeding(token, status).await;
            }
            (EngineAlert::ScrapeReply { complete, .. }, SessionRole::Recounting) => {
                self.complete_recount(token, complete, now).await;
            }
            (EngineAlert::ScrapeReply { .. }, SessionRole::Seeding) => {
                trace!(%token, "scrape reply for seeding participant ignored");
            }
            (EngineAlert::Unhandled { kind, .. }, _) => {
                trace!(%token, kind = %kind, "unhandled engine alert");
            }
        }
    }

    async fn confirm_seeding(&mut self, token: SessionToken, status: TorrentSnapshot) {
        let Some(name) = self.seeding.get(&token).map(|session| session.name.clone()) else {
            return;
        };
        match self.stats.get(&name) {
            None => {
                info!(torrent = %name, "seeding confirmed for an unregistered torrent; removing it");
                self.stop_seeding(token).await;
            }
            Some(record) if record.seeder_count == 0 && !status.has_complete_copy => {
                info!(
                    torrent = %name,
                    "no seeders and no local copy; unable to seed, unregistering"
                );
                self.stats.remove(&name);
                self.stop_seeding(token).await;
            }
            Some(_) => {
                info!(torrent = %name, seeding = self.seeding.len(), "started seeding");
            }
        }
    }

    async fn complete_recount(&mut self, token: SessionToken, complete: i64, now: u64) {
        let Some(seeders) = seeders_from_scrape(complete) else {
            warn!(%token, complete, "scrape reply carried an invalid seeder count; ignoring it");
            return;
        };
        let Some(session) = self.recounting.remove(&token) else {
            return;
        };
        let elapsed = session.age(now);
        info!(torrent = %session.name, seeders, elapsed, "tracker reported seeders");
        if !self.stats.record_measurement(&session.name, now, seeders) {
            debug!(torrent = %session.name, "record unregistered during recount; measurement dropped");
        }
        self.retire_recount(&session).await;
    }
}
