//! Tick loop driving the controller: slow reconciliation on the update delay,
//! recount scheduling and alert reconciliation every tick.

use std::future::Future;
use std::time::Duration;

use btup_config::defaults::TICK_MILLIS;
use btup_torrent_core::SeedEngine;
use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::controller::Controller;
use crate::error::AppResult;

/// Seconds since the Unix epoch, clamped at zero.
#[must_use]
pub fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

/// Summary of one loop iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the slow reconciliation pass ran.
    pub updated: bool,
    /// Recounts finalized by timeout.
    pub timed_out: usize,
    /// Recounts started.
    pub recounts_started: usize,
    /// Alerts drained from the engine.
    pub alerts: usize,
    /// Whether statistics were written.
    pub flushed: bool,
}

/// Owns the controller and schedules its operations.
pub struct Orchestrator<E> {
    controller: Controller<E>,
    last_update: Option<u64>,
}

impl<E> Orchestrator<E>
where
    E: SeedEngine,
{
    /// Wrap a controller; the first tick always runs the slow pass.
    #[must_use]
    pub const fn new(controller: Controller<E>) -> Self {
        Self {
            controller,
            last_update: None,
        }
    }

    /// Borrow the controller.
    #[must_use]
    pub const fn controller(&self) -> &Controller<E> {
        &self.controller
    }

    /// Mutably borrow the controller.
    pub const fn controller_mut(&mut self) -> &mut Controller<E> {
        &mut self.controller
    }

    fn update_due(&self, now: u64) -> bool {
        let delay = self.controller.config().update_delay.as_secs();
        self.last_update
            .is_none_or(|last| now.saturating_sub(last) > delay)
    }

    /// Run one loop iteration at time `now`.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog or data directory cannot be
    /// reconciled or statistics cannot be written.
    pub async fn tick(&mut self, now: u64) -> AppResult<TickReport> {
        let mut report = TickReport::default();
        if self.update_due(now) {
            self.controller.update(now).await?;
            self.last_update = Some(now);
            report.updated = true;
        }

        report.timed_out = self.controller.finalize_timed_out(now).await.len();
        report.recounts_started = self.controller.start_recounts(now).await.len();
        report.alerts = self.controller.reconcile_alerts(now).await;
        report.flushed = self.controller.flush_stats_if_due(now)?;
        Ok(report)
    }

    /// Tick once per second until `shutdown` resolves, then shut the
    /// controller down.
    ///
    /// # Errors
    ///
    /// Returns the first fatal tick error, after attempting a clean shutdown,
    /// or the shutdown error itself.
    pub async fn run_until<F>(mut self, shutdown: F) -> AppResult<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(Duration::from_millis(TICK_MILLIS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        info!("controller loop started");

        let outcome = loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                }
                _ = ticker.tick() => {
                    match self.tick(unix_now()).await {
                        Ok(report) => debug!(?report, "tick complete"),
                        Err(err) => {
                            error!(error = ?err, "fatal controller error");
                            break Err(err);
                        }
                    }
                }
            }
        };

        let closed = self.controller.shutdown(unix_now()).await;
        outcome.and(closed)
    }
}
