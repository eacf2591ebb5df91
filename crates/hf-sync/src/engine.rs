use crate::storage::KeyValueStore;
use crate::{
    LocalState, ReconcileOutcome, ReconcileScheduler, Reconciler, SessionManager, SyncResult,
    ToggleController,
};

use hf_client::{FavoritesAuthority, SessionAuthority};
use hf_config::Config;

use std::sync::Arc;

use log::info;

/// The two server-side collaborators.
#[derive(Clone)]
pub struct Authorities {
    pub session: Arc<dyn SessionAuthority>,
    pub favorites: Arc<dyn FavoritesAuthority>,
}

impl Authorities {
    /// Use one object for both, as the HTTP and in-memory authorities do.
    pub fn shared<A>(authority: Arc<A>) -> Self
    where
        A: SessionAuthority + FavoritesAuthority + 'static,
    {
        Self {
            session: authority.clone(),
            favorites: authority,
        }
    }
}

/// Every sync component, constructed once and wired together.
pub struct SyncEngine {
    state: Arc<LocalState>,
    reconciler: Arc<Reconciler>,
    toggles: Arc<ToggleController>,
    session: SessionManager,
    poll_interval: std::time::Duration,
    check_on_visible: bool,
    startup: ReconcileOutcome,
}

impl SyncEngine {
    /// Build the engine, load persisted state and run the start-up check.
    pub async fn bootstrap(
        store: Arc<dyn KeyValueStore>,
        authorities: Authorities,
        config: &Config,
    ) -> SyncResult<Self> {
        let state = Arc::new(LocalState::new(store));
        let identity = state.load()?;

        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&state),
            Arc::clone(&authorities.session),
            config.reconcile.timeout(),
        ));
        let toggles = Arc::new(ToggleController::new(
            Arc::clone(&state),
            Arc::clone(&authorities.favorites),
        ));
        let session = SessionManager::new(
            Arc::clone(&state),
            authorities.session,
            Arc::clone(&reconciler),
            Arc::clone(&toggles),
        );

        let startup = reconciler.on_start().await?;
        info!(
            "Sync engine ready (user: {}, startup check: {startup:?})",
            identity
                .map(|i| i.id.to_string())
                .unwrap_or_else(|| String::from("anonymous"))
        );

        Ok(Self {
            state,
            reconciler,
            toggles,
            session,
            poll_interval: config.reconcile.poll_interval(),
            check_on_visible: config.reconcile.check_on_visible,
            startup,
        })
    }

    pub fn state(&self) -> &Arc<LocalState> {
        &self.state
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    pub fn toggles(&self) -> &Arc<ToggleController> {
        &self.toggles
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Result of the check run during bootstrap.
    pub fn startup_outcome(&self) -> &ReconcileOutcome {
        &self.startup
    }

    /// A scheduler for the configured interval, driving this engine's reconciler.
    pub fn scheduler(&self) -> ReconcileScheduler<Reconciler> {
        ReconcileScheduler::new(
            Arc::clone(&self.reconciler),
            self.poll_interval,
            self.check_on_visible,
        )
    }
}
