//! In-process stand-in for both authorities.
//!
//! Models a single browser talking to the site: one session slot, a table of
//! accounts and the `(user, listing)` favorites relation. Failures can be
//! injected per operation, and favorite mutations can be held open so callers
//! can observe requests that are still in flight.

use crate::{
    ClientError, ClientResult, FavoriteAck, FavoritesAuthority, LoginOutcome,
    NOT_LOGGED_IN_MESSAGE, RejectReason, SessionAuthority, SessionStatus,
};

use hf_core::{Credentials, FavoriteListing, Identity, ListingId, Registration};

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ValidateSession,
    Login,
    Register,
    Logout,
    IsFavorite,
    AddFavorite,
    RemoveFavorite,
    ListFavorites,
}

/// Failure to produce instead of the normal response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Network-level failure: the call returns `Err`.
    Unavailable,
    /// The call never completes.
    Hang,
    /// Mutations report `Rejected(ServerError)`; other calls return `Err`.
    ServerError(String),
}

struct Account {
    identity: Identity,
    password: String,
}

struct FavoriteRow {
    user_id: i64,
    listing_id: ListingId,
    sequence: u64,
}

#[derive(Default)]
struct MemoryState {
    accounts: Vec<Account>,
    session_user: Option<i64>,
    favorites: Vec<FavoriteRow>,
    next_sequence: u64,
    next_user_id: i64,
    failures: HashMap<Operation, VecDeque<InjectedFailure>>,
    calls: HashMap<Operation, usize>,
}

pub struct InMemoryAuthority {
    state: Mutex<MemoryState>,
    mutations_open: watch::Sender<bool>,
}

impl Default for InMemoryAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthority {
    pub fn new() -> Self {
        let (mutations_open, _) = watch::channel(true);
        Self {
            state: Mutex::new(MemoryState {
                next_user_id: 1,
                ..MemoryState::default()
            }),
            mutations_open,
        }
    }

    /// Register an account that `login` will accept.
    pub fn with_account(self, identity: Identity, password: &str) -> Self {
        {
            let mut state = self.lock();
            state.next_user_id = state.next_user_id.max(identity.id + 1);
            state.accounts.push(Account {
                identity,
                password: password.to_string(),
            });
        }
        self
    }

    /// Make `user_id` the signed-in user without going through `login`.
    pub fn sign_in_as(&self, user_id: i64) {
        self.lock().session_user = Some(user_id);
    }

    /// Drop the server-side session, as an expiry or a logout elsewhere would.
    pub fn expire_session(&self) {
        self.lock().session_user = None;
    }

    /// Replace the stored profile of an existing account.
    pub fn update_account(&self, identity: Identity) {
        let mut state = self.lock();
        if let Some(account) = state
            .accounts
            .iter_mut()
            .find(|a| a.identity.id == identity.id)
        {
            account.identity = identity;
        }
    }

    /// Queue a failure for the next call of `operation`.
    pub fn fail_next(&self, operation: Operation, failure: InjectedFailure) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(failure);
    }

    /// Hold add/remove requests open until `release_mutations` is called.
    pub fn hold_mutations(&self) {
        self.mutations_open.send_replace(false);
    }

    pub fn release_mutations(&self) {
        self.mutations_open.send_replace(true);
    }

    /// Number of times `operation` has been invoked, including held calls.
    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Favorites of `user_id`, most recent first.
    pub fn favorites_of(&self, user_id: i64) -> Vec<ListingId> {
        let state = self.lock();
        Self::rows_for(&state, user_id)
            .into_iter()
            .map(|row| row.listing_id.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // State stays consistent across a panicking test
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn rows_for(state: &MemoryState, user_id: i64) -> Vec<&FavoriteRow> {
        let mut rows: Vec<&FavoriteRow> = state
            .favorites
            .iter()
            .filter(|row| row.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        rows
    }

    /// Count the call and pop any queued failure.
    fn begin(&self, operation: Operation) -> Option<InjectedFailure> {
        let mut state = self.lock();
        *state.calls.entry(operation).or_insert(0) += 1;
        state
            .failures
            .get_mut(&operation)
            .and_then(|queue| queue.pop_front())
    }

    async fn fail(&self, operation: Operation, failure: InjectedFailure) -> ClientError {
        match failure {
            InjectedFailure::Unavailable => {
                ClientError::unavailable(format!("{operation:?}: connection refused"))
            }
            InjectedFailure::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
            InjectedFailure::ServerError(message) => ClientError::status(500, message),
        }
    }

    async fn wait_until_mutations_open(&self) {
        let mut open = self.mutations_open.subscribe();
        // Sender lives in self, so this only ends when the gate opens
        let _ = open.wait_for(|is_open| *is_open).await;
    }

    async fn mutate(
        &self,
        operation: Operation,
        listing_id: &ListingId,
        add: bool,
    ) -> ClientResult<FavoriteAck> {
        let failure = self.begin(operation);
        self.wait_until_mutations_open().await;

        match failure {
            Some(InjectedFailure::ServerError(message)) => {
                return Ok(FavoriteAck::Rejected(RejectReason::ServerError(message)));
            }
            Some(failure) => return Err(self.fail(operation, failure).await),
            None => {}
        }

        let mut state = self.lock();
        let Some(user_id) = state.session_user else {
            debug!("{operation:?} {listing_id}: {NOT_LOGGED_IN_MESSAGE}");
            return Ok(FavoriteAck::Rejected(RejectReason::NotAuthenticated));
        };

        let exists = state
            .favorites
            .iter()
            .any(|row| row.user_id == user_id && &row.listing_id == listing_id);

        if add && !exists {
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            state.favorites.push(FavoriteRow {
                user_id,
                listing_id: listing_id.clone(),
                sequence,
            });
        } else if !add && exists {
            state
                .favorites
                .retain(|row| !(row.user_id == user_id && &row.listing_id == listing_id));
        }

        Ok(FavoriteAck::Applied)
    }
}

#[async_trait]
impl SessionAuthority for InMemoryAuthority {
    async fn validate_session(&self) -> ClientResult<SessionStatus> {
        if let Some(failure) = self.begin(Operation::ValidateSession) {
            return Err(self.fail(Operation::ValidateSession, failure).await);
        }

        let state = self.lock();
        let identity = state.session_user.and_then(|user_id| {
            state
                .accounts
                .iter()
                .find(|a| a.identity.id == user_id)
                .map(|a| a.identity.clone())
        });

        Ok(match identity {
            Some(identity) => SessionStatus::LoggedIn(identity),
            None => SessionStatus::LoggedOut,
        })
    }

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginOutcome> {
        if let Some(failure) = self.begin(Operation::Login) {
            return Err(self.fail(Operation::Login, failure).await);
        }

        let mut state = self.lock();
        let found = state
            .accounts
            .iter()
            .find(|a| {
                a.identity.email.eq_ignore_ascii_case(credentials.email.trim())
                    && a.password == credentials.password
            })
            .map(|a| a.identity.clone());

        Ok(match found {
            Some(identity) => {
                state.session_user = Some(identity.id);
                LoginOutcome::Authenticated(identity)
            }
            None => LoginOutcome::Rejected {
                message: String::from("Invalid email or password"),
            },
        })
    }

    async fn register(&self, registration: &Registration) -> ClientResult<LoginOutcome> {
        if let Some(failure) = self.begin(Operation::Register) {
            return Err(self.fail(Operation::Register, failure).await);
        }

        let mut state = self.lock();
        let taken = state
            .accounts
            .iter()
            .any(|a| a.identity.email.eq_ignore_ascii_case(registration.email.trim()));
        if taken {
            return Ok(LoginOutcome::Rejected {
                message: String::from("Email already registered"),
            });
        }

        let id = state.next_user_id;
        state.next_user_id += 1;
        let identity =
            Identity::new(id, registration.email.trim()).with_display_name(registration.name.trim());
        state.accounts.push(Account {
            identity: identity.clone(),
            password: registration.password.clone(),
        });
        state.session_user = Some(id);

        Ok(LoginOutcome::Authenticated(identity))
    }

    async fn logout(&self) -> ClientResult<()> {
        if let Some(failure) = self.begin(Operation::Logout) {
            return Err(self.fail(Operation::Logout, failure).await);
        }

        self.lock().session_user = None;
        Ok(())
    }
}

#[async_trait]
impl FavoritesAuthority for InMemoryAuthority {
    async fn is_favorite(&self, listing_id: &ListingId) -> ClientResult<bool> {
        if let Some(failure) = self.begin(Operation::IsFavorite) {
            return Err(self.fail(Operation::IsFavorite, failure).await);
        }

        let state = self.lock();
        let Some(user_id) = state.session_user else {
            return Err(ClientError::api(NOT_LOGGED_IN_MESSAGE));
        };

        Ok(state
            .favorites
            .iter()
            .any(|row| row.user_id == user_id && &row.listing_id == listing_id))
    }

    async fn add_favorite(&self, listing_id: &ListingId) -> ClientResult<FavoriteAck> {
        self.mutate(Operation::AddFavorite, listing_id, true).await
    }

    async fn remove_favorite(&self, listing_id: &ListingId) -> ClientResult<FavoriteAck> {
        self.mutate(Operation::RemoveFavorite, listing_id, false).await
    }

    async fn list_favorites(&self) -> ClientResult<Vec<FavoriteListing>> {
        if let Some(failure) = self.begin(Operation::ListFavorites) {
            return Err(self.fail(Operation::ListFavorites, failure).await);
        }

        let state = self.lock();
        let Some(user_id) = state.session_user else {
            return Err(ClientError::api(NOT_LOGGED_IN_MESSAGE));
        };

        Ok(Self::rows_for(&state, user_id)
            .into_iter()
            .map(|row| FavoriteListing {
                listing_id: row.listing_id.clone(),
                title: None,
                favorited_at: None,
            })
            .collect())
    }
}
