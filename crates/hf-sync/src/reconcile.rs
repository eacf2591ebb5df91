use crate::{LocalState, ReconcileTriggers, SyncResult, lock};

use hf_client::{SessionAuthority, SessionStatus};
use hf_core::Identity;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// Loaded from storage, not yet checked against the server.
    Unverified,
    /// The server agreed with (or corrected) the local identity at `at`.
    Verified { at: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Process start.
    Start,
    /// Periodic timer.
    Tick,
    /// The view became visible again.
    Visible,
    /// Explicit request; also runs for anonymous visitors.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to check, or a check was already running.
    Skipped,
    /// The server agreed with the local identity.
    Unchanged,
    /// The local identity was overwritten with the server's.
    Hydrated(Identity),
    /// The server session is gone; identity and favorites were cleared.
    Cleared,
    /// The server did not answer in time or failed; nothing changed.
    Unreachable,
}

/// Repairs the local identity against the session authority.
///
/// The server's answer always wins: the local identity is either left alone,
/// overwritten, or cleared, never merged. A failed or timed-out check is no
/// information at all and changes nothing.
pub struct Reconciler {
    state: Arc<LocalState>,
    session: Arc<dyn SessionAuthority>,
    timeout: Duration,
    verification: Mutex<VerificationState>,
    running: AtomicBool,
}

impl Reconciler {
    pub fn new(
        state: Arc<LocalState>,
        session: Arc<dyn SessionAuthority>,
        timeout: Duration,
    ) -> Self {
        Self {
            state,
            session,
            timeout,
            verification: Mutex::new(VerificationState::Unverified),
            running: AtomicBool::new(false),
        }
    }

    pub fn verification(&self) -> VerificationState {
        *lock(&self.verification)
    }

    /// Record that the identity was just confirmed by other means, e.g. a login.
    pub fn mark_verified(&self) {
        *lock(&self.verification) = VerificationState::Verified { at: Utc::now() };
    }

    pub async fn on_start(&self) -> SyncResult<ReconcileOutcome> {
        self.reconcile(Trigger::Start).await
    }

    pub async fn reconcile(&self, trigger: Trigger) -> SyncResult<ReconcileOutcome> {
        let before = self.state.identity().get();

        if before.is_none() && trigger != Trigger::Manual {
            debug!("{trigger:?}: no identity, skipping session check");
            return Ok(ReconcileOutcome::Skipped);
        }

        let Some(_running) = RunningGuard::acquire(&self.running) else {
            debug!("{trigger:?}: session check already running, skipping");
            return Ok(ReconcileOutcome::Skipped);
        };

        let check = tokio::time::timeout(self.timeout, self.session.validate_session());
        let status = match check.await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!("{trigger:?}: session authority unreachable, keeping local state: {e}");
                return Ok(ReconcileOutcome::Unreachable);
            }
            Err(_) => {
                warn!(
                    "{trigger:?}: session check timed out after {:?}, keeping local state",
                    self.timeout
                );
                return Ok(ReconcileOutcome::Unreachable);
            }
        };

        // The local identity may have moved while the request was out
        let current = self.state.identity().get();
        if before.is_some() && current.is_none() {
            debug!("{trigger:?}: identity cleared during session check, ignoring answer");
            return Ok(ReconcileOutcome::Skipped);
        }

        let outcome = match (status, current) {
            (SessionStatus::LoggedOut, None) => ReconcileOutcome::Unchanged,
            (SessionStatus::LoggedOut, Some(local)) => {
                info!("{trigger:?}: server session for user {} is gone, clearing", local.id);
                self.state.clear_session()?;
                ReconcileOutcome::Cleared
            }
            (SessionStatus::LoggedIn(server), Some(local)) if server == local => {
                ReconcileOutcome::Unchanged
            }
            (SessionStatus::LoggedIn(server), _) => {
                info!("{trigger:?}: adopting server identity for user {}", server.id);
                self.state.adopt_identity(server.clone())?;
                ReconcileOutcome::Hydrated(server)
            }
        };

        self.mark_verified();
        Ok(outcome)
    }
}

#[async_trait]
impl ReconcileTriggers for Reconciler {
    async fn on_tick(&self) -> SyncResult<ReconcileOutcome> {
        self.reconcile(Trigger::Tick).await
    }

    async fn on_visible(&self) -> SyncResult<ReconcileOutcome> {
        self.reconcile(Trigger::Visible).await
    }
}

/// Holds the single "check in progress" slot.
struct RunningGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
