//! Bounded recount scheduling with timeout finalization.

use btup_torrent_core::{
    AddTorrent, RECOUNT_DOWNLOAD_LIMIT_BPS, SeedEngine, Session, SessionRole, SessionToken,
};
use tracing::{debug, info, warn};

use super::Controller;

impl<E> Controller<E>
where
    E: SeedEngine,
{
    /// Finalize every recount older than the timeout using the peer count the
    /// engine currently knows. Returns the finalized names.
    pub async fn finalize_timed_out(&mut self, now: u64) -> Vec<String> {
        let timeout = self.config.recount_timeout_secs;
        let expired: Vec<SessionToken> = self
            .recounting
            .values()
            .filter(|session| session.age(now) > timeout)
            .map(|session| session.token)
            .collect();

        let mut finalized = Vec::with_capacity(expired.len());
        for token in expired {
            let Some(session) = self.recounting.remove(&token) else {
                continue;
            };
            let status = match self.engine.status(token).await {
                Ok(status) => status,
                Err(err) => {
                    warn!(torrent = %session.name, error = %err, "engine status unavailable");
                    None
                }
            };
            match status {
                Some(snapshot) => {
                    info!(
                        torrent = %session.name,
                        known_peers = snapshot.known_peers,
                        "no tracker response; using known peer count instead"
                    );
                    self.stats
                        .record_measurement(&session.name, now, snapshot.known_peers);
                }
                None => {
                    info!(torrent = %session.name, "no tracker response and no engine status; keeping previous count");
                    self.stats.touch(&session.name, now);
                }
            }
            self.retire_recount(&session).await;
            finalized.push(session.name);
        }
        finalized
    }

    /// Start recounts for stale records until the parallelism cap is reached.
    /// Returns the names whose recount was started.
    pub async fn start_recounts(&mut self, now: u64) -> Vec<String> {
        let limit = self.config.max_parallel_recounts;
        let mut started = Vec::new();
        if self.recounting.len() >= limit {
            return started;
        }
        debug!("starting recounts");

        let min_age = self.config.min_recount_age_secs;
        let stale: Vec<String> = self
            .stats
            .iter()
            .filter(|(_, record)| now.saturating_sub(record.last_measured_time) >= min_age)
            .map(|(name, _)| name.to_string())
            .collect();

        for name in stale {
            if self.is_recounting(&name) {
                continue;
            }
            match self.layout.definition_exists(&name) {
                Ok(true) => {}
                Ok(false) => {
                    info!(torrent = %name, "definition missing; unregistering");
                    self.stats.remove(&name);
                    if let Some(token) = self.seeding_token(&name) {
                        self.stop_seeding(token).await;
                    }
                    continue;
                }
                Err(err) => {
                    warn!(torrent = %name, error = ?err, "cannot check definition; skipping recount");
                    continue;
                }
            }

            if self.start_recount(&name, now).await {
                started.push(name);
            }
            if self.recounting.len() >= limit {
                break;
            }
        }
        started
    }

    async fn start_recount(&mut self, name: &str, now: u64) -> bool {
        let session = Session::new(name, SessionRole::Recounting, now);
        let token = session.token;
        let request = AddTorrent {
            token,
            name: name.to_string(),
            definition: self.layout.definition_path(name),
            save_path: self.layout.scratch_path(name),
            download_limit_bps: Some(RECOUNT_DOWNLOAD_LIMIT_BPS),
        };
        match self.engine.add_torrent(request).await {
            Ok(()) => {
                info!(torrent = %name, "recounting seeders");
                self.recounting.insert(token, session);
                true
            }
            Err(err) => {
                warn!(torrent = %name, error = %err, "engine rejected recount add");
                false
            }
        }
    }
}
