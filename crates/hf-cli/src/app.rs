use crate::commands::Commands;
use crate::favorite_commands::FavoriteCommands;
use crate::{CliResult, OFFLINE_DEMO_EMAIL, OFFLINE_DEMO_PASSWORD, OFFLINE_DEMO_USER_ID};

use hf_client::{FavoritesAuthority, HttpAuthority, InMemoryAuthority, LoginOutcome};
use hf_config::Config;
use hf_core::{Credentials, Identity, ListingId, Registration};
use hf_sync::storage::{FAVORITES_KEY, IDENTITY_KEY, SESSION_KEY};
use hf_sync::{
    Authorities, FileStore, KeyValueStore, ReconcileOutcome, SyncEngine, ToggleOutcome, Trigger,
    VerificationState, Visibility,
};

use std::future::Future;
use std::io::BufRead;
use std::sync::Arc;

use log::{info, warn};
use serde_json::{Value, json};
use tokio::sync::{broadcast, watch};

/// One invocation of the `hf` binary: an engine over the on-disk state plus
/// the authority it talks to.
pub struct App {
    engine: SyncEngine,
    store: Arc<dyn KeyValueStore>,
    http: Option<Arc<HttpAuthority>>,
}

impl App {
    /// Open the state directory from `config` and bootstrap the engine.
    pub async fn open(config: &Config, server: Option<&str>, offline: bool) -> CliResult<Self> {
        let store = Arc::new(FileStore::open(config.storage_dir()?)?);
        Self::with_store(store, config, server, offline).await
    }

    pub async fn with_store(
        store: Arc<dyn KeyValueStore>,
        config: &Config,
        server: Option<&str>,
        offline: bool,
    ) -> CliResult<Self> {
        let (authorities, http) = if offline {
            let demo = offline_authority(store.as_ref()).await?;
            (Authorities::shared(demo), None)
        } else {
            let mut server_config = config.server.clone();
            if let Some(url) = server {
                server_config.base_url = url.to_string();
            }
            let http = Arc::new(HttpAuthority::from_config(&server_config)?);
            http.set_session_token(read_session_token(store.as_ref())?);
            (Authorities::shared(Arc::clone(&http)), Some(http))
        };

        let engine = SyncEngine::bootstrap(Arc::clone(&store), authorities, config).await?;
        engine.toggles().on_auth_required(|listing_id| {
            warn!("Sign in to save listing {listing_id} (hf login --email ... --password ...)");
        });

        Ok(Self {
            engine,
            store,
            http,
        })
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Run one command. `watch` is handled by [`App::watch_until`].
    pub async fn execute(&self, command: Commands) -> CliResult<Value> {
        let value = match command {
            Commands::Login { email, password } => {
                let outcome = self
                    .engine
                    .session()
                    .login(&Credentials::new(email, password))
                    .await?;
                login_json(outcome)
            }
            Commands::Register {
                name,
                email,
                password,
            } => {
                let registration = Registration {
                    name,
                    email,
                    password,
                };
                let outcome = self.engine.session().register(&registration).await?;
                login_json(outcome)
            }
            Commands::Logout => {
                let previous = self.engine.session().logout().await?;
                json!({ "loggedOut": previous.is_some(), "user": previous })
            }
            Commands::Whoami => self.whoami(),
            Commands::Reconcile => {
                let outcome = self.engine.reconciler().reconcile(Trigger::Manual).await?;
                json!({
                    "outcome": reconcile_label(&outcome),
                    "user": self.engine.state().identity().get(),
                })
            }
            Commands::Watch => {
                let (visibility, visibility_rx) = watch::channel(Visibility::Visible);
                spawn_visibility_reader(visibility);
                return self.watch_until(visibility_rx, wait_for_ctrl_c()).await;
            }
            Commands::Favorite { action } => self.favorite(action).await?,
        };

        self.persist_session()?;
        Ok(value)
    }

    /// Drive the background checks until `stop` completes.
    pub async fn watch_until<F>(
        &self,
        visibility: watch::Receiver<Visibility>,
        stop: F,
    ) -> CliResult<Value>
    where
        F: Future<Output = ()>,
    {
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let scheduler = tokio::spawn(self.engine.scheduler().run(visibility, shutdown_rx));

        let mut identity = self.engine.state().identity().subscribe();
        let user_changes = tokio::spawn(async move {
            while identity.changed().await.is_ok() {
                match &*identity.borrow_and_update() {
                    Some(user) => info!("Signed in as {}", user.label()),
                    None => info!("Signed out"),
                }
            }
        });

        stop.await;

        let _ = shutdown.send(());
        if let Err(e) = scheduler.await {
            warn!("Scheduler task ended abnormally: {e}");
        }
        user_changes.abort();

        self.persist_session()?;
        Ok(json!({
            "stopped": true,
            "verified": self.is_verified(),
            "user": self.engine.state().identity().get(),
        }))
    }

    fn is_verified(&self) -> bool {
        matches!(
            self.engine.reconciler().verification(),
            VerificationState::Verified { .. }
        )
    }

    fn whoami(&self) -> Value {
        let state = self.engine.state();
        json!({
            "user": state.identity().get(),
            "verified": self.is_verified(),
            "startup": reconcile_label(self.engine.startup_outcome()),
            "favorites": state.favorites().len(),
        })
    }

    async fn favorite(&self, action: FavoriteCommands) -> CliResult<Value> {
        let state = self.engine.state();
        let toggles = self.engine.toggles();

        let value = match action {
            FavoriteCommands::Toggle { id } => {
                let listing_id = ListingId::parse(&id)?;
                let outcome = toggles.toggle(&listing_id).await?;
                json!({
                    "listingId": listing_id,
                    "outcome": toggle_label(outcome),
                    "liked": state.is_liked(&listing_id),
                })
            }
            FavoriteCommands::Check { id, refresh } => {
                let listing_id = ListingId::parse(&id)?;
                let confirmed = if refresh {
                    toggles.refresh(&listing_id).await?.is_some()
                } else {
                    false
                };
                json!({
                    "listingId": listing_id,
                    "liked": state.is_liked(&listing_id),
                    "confirmed": confirmed,
                })
            }
            FavoriteCommands::List => json!({ "favorites": state.favorites().snapshot() }),
            FavoriteCommands::Sync => {
                let diff = toggles.hydrate().await?;
                let synced = diff.is_some();
                let diff = diff.unwrap_or_default();
                json!({
                    "synced": synced,
                    "added": diff.added,
                    "removed": diff.removed,
                    "favorites": state.favorites().snapshot(),
                })
            }
        };

        Ok(value)
    }

    /// Save whatever session cookie the server holds us to, so the next
    /// invocation continues the same session.
    fn persist_session(&self) -> CliResult<()> {
        let Some(http) = &self.http else {
            return Ok(());
        };

        match http.session_token() {
            Some(token) => self
                .store
                .write(SESSION_KEY, &serde_json::to_string(&token)?)?,
            None => self.store.remove(SESSION_KEY)?,
        }
        Ok(())
    }
}

fn read_session_token(store: &dyn KeyValueStore) -> CliResult<Option<String>> {
    let Some(raw) = store.read(SESSION_KEY)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            warn!("Ignoring unreadable session entry: {e}");
            Ok(None)
        }
    }
}

/// Demo site for `--offline`: one account, signed in whenever the persisted
/// identity is that account, with the persisted favorites as its server side.
async fn offline_authority(store: &dyn KeyValueStore) -> CliResult<Arc<InMemoryAuthority>> {
    let demo = Identity::new(OFFLINE_DEMO_USER_ID, OFFLINE_DEMO_EMAIL).with_display_name("Demo");
    let authority =
        Arc::new(InMemoryAuthority::new().with_account(demo, OFFLINE_DEMO_PASSWORD));

    let persisted = store
        .read(IDENTITY_KEY)?
        .and_then(|raw| serde_json::from_str::<Identity>(&raw).ok());
    if persisted.is_some_and(|identity| identity.id == OFFLINE_DEMO_USER_ID) {
        authority.sign_in_as(OFFLINE_DEMO_USER_ID);

        let liked: Vec<ListingId> = store
            .read(FAVORITES_KEY)?
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        for listing_id in &liked {
            authority.add_favorite(listing_id).await?;
        }
    }

    Ok(authority)
}

/// Feed `visible`/`hidden` lines from stdin into `sender`.
///
/// Runs on a plain thread: a blocking stdin read must not hold up runtime
/// shutdown after Ctrl-C.
fn spawn_visibility_reader(sender: watch::Sender<Visibility>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match line.trim() {
                "visible" => {
                    sender.send_replace(Visibility::Visible);
                }
                "hidden" => {
                    sender.send_replace(Visibility::Hidden);
                }
                "" => {}
                other => warn!("Unknown input {other:?}, expected 'visible' or 'hidden'"),
            }
        }
    });
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C, stopping: {e}");
    }
}

fn login_json(outcome: LoginOutcome) -> Value {
    match outcome {
        LoginOutcome::Authenticated(user) => json!({ "success": true, "user": user }),
        LoginOutcome::Rejected { message } => json!({ "success": false, "message": message }),
    }
}

fn reconcile_label(outcome: &ReconcileOutcome) -> &'static str {
    match outcome {
        ReconcileOutcome::Skipped => "skipped",
        ReconcileOutcome::Unchanged => "unchanged",
        ReconcileOutcome::Hydrated(_) => "hydrated",
        ReconcileOutcome::Cleared => "cleared",
        ReconcileOutcome::Unreachable => "unreachable",
    }
}

fn toggle_label(outcome: ToggleOutcome) -> &'static str {
    match outcome {
        ToggleOutcome::Confirmed { .. } => "confirmed",
        ToggleOutcome::RolledBack { .. } => "rolled_back",
        ToggleOutcome::Retained { .. } => "retained",
        ToggleOutcome::AlreadyPending => "already_pending",
        ToggleOutcome::AuthenticationRequired => "authentication_required",
    }
}
