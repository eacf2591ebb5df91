use crate::{LocalState, Reconciler, SyncResult, ToggleController};

use hf_client::{LoginOutcome, SessionAuthority};
use hf_core::{Credentials, Identity, Registration};

use std::sync::Arc;

use log::{info, warn};

/// Explicit sign-in, sign-up and sign-out.
///
/// These are the only places where the identity is created outside of
/// reconciliation. Unlike background checks, failures here are returned to
/// the caller since a user is waiting on them.
pub struct SessionManager {
    state: Arc<LocalState>,
    session: Arc<dyn SessionAuthority>,
    reconciler: Arc<Reconciler>,
    toggles: Arc<ToggleController>,
}

impl SessionManager {
    pub fn new(
        state: Arc<LocalState>,
        session: Arc<dyn SessionAuthority>,
        reconciler: Arc<Reconciler>,
        toggles: Arc<ToggleController>,
    ) -> Self {
        Self {
            state,
            session,
            reconciler,
            toggles,
        }
    }

    pub async fn login(&self, credentials: &Credentials) -> SyncResult<LoginOutcome> {
        credentials.validate()?;

        let outcome = self.session.login(credentials).await?;
        if let LoginOutcome::Authenticated(identity) = &outcome {
            self.establish(identity.clone()).await?;
        }
        Ok(outcome)
    }

    pub async fn register(&self, registration: &Registration) -> SyncResult<LoginOutcome> {
        registration.validate()?;

        let outcome = self.session.register(registration).await?;
        if let LoginOutcome::Authenticated(identity) = &outcome {
            self.establish(identity.clone()).await?;
        }
        Ok(outcome)
    }

    /// Sign out on the server and locally.
    ///
    /// Local state is cleared even if the server cannot be reached.
    pub async fn logout(&self) -> SyncResult<Option<Identity>> {
        if let Err(e) = self.session.logout().await {
            warn!("Logout request failed, clearing local session anyway: {e}");
        }

        let previous = self.state.clear_session()?;
        info!("Logged out");
        Ok(previous)
    }

    async fn establish(&self, identity: Identity) -> SyncResult<()> {
        let user_id = identity.id;
        self.state.adopt_identity(identity)?;
        self.reconciler.mark_verified();

        match self.toggles.hydrate().await? {
            Some(_) => info!(
                "Signed in as user {user_id}, {} favorites loaded",
                self.state.favorites().len()
            ),
            None => info!("Signed in as user {user_id}, favorites not loaded"),
        }
        Ok(())
    }
}
