use crate::{ReconcileOutcome, SyncResult};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// What the scheduler calls; lets the reconcile logic be tested without timers.
#[async_trait]
pub trait ReconcileTriggers: Send + Sync {
    async fn on_tick(&self) -> SyncResult<ReconcileOutcome>;

    async fn on_visible(&self) -> SyncResult<ReconcileOutcome>;
}

/// Drives reconciliation from a fixed interval and visibility changes.
pub struct ReconcileScheduler<T: ReconcileTriggers + ?Sized> {
    triggers: Arc<T>,
    period: Duration,
    check_on_visible: bool,
}

impl<T: ReconcileTriggers + ?Sized> ReconcileScheduler<T> {
    pub fn new(triggers: Arc<T>, period: Duration, check_on_visible: bool) -> Self {
        Self {
            triggers,
            period,
            check_on_visible,
        }
    }

    /// Run until `shutdown` fires or its sender is dropped.
    ///
    /// The first tick happens one `period` after start; the start-up check is
    /// the caller's job. A `Hidden -> Visible` transition triggers an extra
    /// check when enabled. Ticks missed while a check was running are not
    /// replayed.
    pub async fn run(
        self,
        mut visibility: watch::Receiver<Visibility>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_visibility = *visibility.borrow_and_update();
        let mut watching_visibility = true;

        info!(
            "Reconcile scheduler started (every {:?}, on visible: {})",
            self.period, self.check_on_visible
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    break;
                }
                _ = ticker.tick() => {
                    log_result("tick", self.triggers.on_tick().await);
                }
                changed = visibility.changed(), if watching_visibility => {
                    if changed.is_err() {
                        debug!("Visibility source closed, relying on the timer alone");
                        watching_visibility = false;
                        continue;
                    }

                    let now = *visibility.borrow_and_update();
                    let regained = last_visibility == Visibility::Hidden && now == Visibility::Visible;
                    last_visibility = now;

                    if regained && self.check_on_visible {
                        log_result("visible", self.triggers.on_visible().await);
                    }
                }
            }
        }

        info!("Reconcile scheduler stopped");
    }
}

fn log_result(trigger: &str, result: SyncResult<ReconcileOutcome>) {
    match result {
        Ok(ReconcileOutcome::Skipped) => {}
        Ok(outcome) => debug!("Reconcile on {trigger}: {outcome:?}"),
        Err(e) => error!("Reconcile on {trigger} failed: {e}"),
    }
}
