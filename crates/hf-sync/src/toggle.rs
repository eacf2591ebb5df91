use crate::pending::{PendingToggles, ToggleState};
use crate::{FavoritesDiff, LocalState, SyncResult, lock};

use hf_client::{FavoriteAck, FavoritesAuthority, RejectReason};
use hf_core::ListingId;

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::task::JoinHandle;

/// Handler for the "authentication required" signal.
pub type AuthRequiredHandler = Arc<dyn Fn(&ListingId) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Server applied the change; `liked` is the new state.
    Confirmed { liked: bool },
    /// Server said the visitor is not signed in; `liked` is the restored state.
    RolledBack { liked: bool },
    /// Server unreachable or failing; the optimistic `liked` was kept.
    Retained { liked: bool },
    /// A toggle for this listing was already in flight; nothing happened.
    AlreadyPending,
    /// No identity; nothing was changed and no request was sent.
    AuthenticationRequired,
}

/// Optimistic like/unlike of listings.
///
/// The local cache and every subscriber see the new state before the server
/// is asked. Only an explicit "not signed in" answer undoes it.
pub struct ToggleController {
    state: Arc<LocalState>,
    favorites: Arc<dyn FavoritesAuthority>,
    pending: PendingToggles,
    auth_required: Mutex<Vec<AuthRequiredHandler>>,
}

impl ToggleController {
    pub fn new(state: Arc<LocalState>, favorites: Arc<dyn FavoritesAuthority>) -> Self {
        Self {
            state,
            favorites,
            pending: PendingToggles::new(),
            auth_required: Mutex::new(Vec::new()),
        }
    }

    /// Register a handler for the "authentication required" signal.
    pub fn on_auth_required<F>(&self, handler: F)
    where
        F: Fn(&ListingId) + Send + Sync + 'static,
    {
        lock(&self.auth_required).push(Arc::new(handler));
    }

    pub fn pending(&self) -> &PendingToggles {
        &self.pending
    }

    /// Flip the like-state of `listing_id`.
    ///
    /// Collaborator failures never surface as `Err`; only a local storage
    /// failure does.
    pub async fn toggle(&self, listing_id: &ListingId) -> SyncResult<ToggleOutcome> {
        let Some(user_id) = self.state.identity().user_id() else {
            info!("Toggle of {listing_id} needs a signed-in user");
            self.signal_auth_required(listing_id);
            return Ok(ToggleOutcome::AuthenticationRequired);
        };

        let Some(mut pending) = self.pending.begin(listing_id) else {
            debug!("Toggle of {listing_id} already in flight, ignoring");
            return Ok(ToggleOutcome::AlreadyPending);
        };

        let previous = self.state.is_liked(listing_id);
        let optimistic = ToggleState::start(previous);
        let desired = !previous;

        self.state.favorites().set(listing_id, desired)?;
        self.state.bus().publish(listing_id, desired);
        pending.advance(optimistic);

        let response = if desired {
            self.favorites.add_favorite(listing_id).await
        } else {
            self.favorites.remove_favorite(listing_id).await
        };

        let (settled, outcome) = match response {
            Ok(FavoriteAck::Applied) => {
                debug!("Server confirmed {listing_id} = {desired}");
                (
                    optimistic.confirm(),
                    ToggleOutcome::Confirmed { liked: desired },
                )
            }
            Ok(FavoriteAck::Rejected(RejectReason::NotAuthenticated)) => {
                self.roll_back(listing_id, user_id, previous, desired)?;
                self.signal_auth_required(listing_id);
                (
                    optimistic.roll_back(),
                    ToggleOutcome::RolledBack { liked: previous },
                )
            }
            Ok(FavoriteAck::Rejected(RejectReason::ServerError(message))) => {
                warn!(
                    "Server failed to store {listing_id} = {desired}, keeping local state: {message}"
                );
                (
                    optimistic.retain(),
                    ToggleOutcome::Retained { liked: desired },
                )
            }
            Err(e) => {
                warn!(
                    "Favorites authority unreachable for {listing_id}, keeping local state: {e}"
                );
                (
                    optimistic.retain(),
                    ToggleOutcome::Retained { liked: desired },
                )
            }
        };

        pending.advance(settled);
        Ok(outcome)
    }

    /// Run [`toggle`](Self::toggle) on a background task.
    pub fn spawn_toggle(
        self: &Arc<Self>,
        listing_id: ListingId,
    ) -> JoinHandle<SyncResult<ToggleOutcome>> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.toggle(&listing_id).await })
    }

    /// Replace the favorites cache with the server's list.
    ///
    /// Listings with a toggle in flight keep their optimistic state. Returns
    /// `None` when there is no identity or the server could not be asked.
    pub async fn hydrate(&self) -> SyncResult<Option<FavoritesDiff>> {
        let Some(user_id) = self.state.identity().user_id() else {
            return Ok(None);
        };

        let listed = match self.favorites.list_favorites().await {
            Ok(listed) => listed,
            Err(e) => {
                warn!("Could not fetch favorites, keeping local set: {e}");
                return Ok(None);
            }
        };

        if self.state.identity().user_id() != Some(user_id) {
            debug!("Identity changed while fetching favorites, discarding result");
            return Ok(None);
        }

        // No toggle may begin between choosing the kept listings and the swap.
        let diff = self.pending.while_locked(|in_flight| {
            let mut next: Vec<ListingId> = listed
                .into_iter()
                .map(|f| f.listing_id)
                .filter(|id| !in_flight.contains_key(id))
                .collect();
            next.extend(
                self.state
                    .favorites()
                    .snapshot()
                    .into_iter()
                    .filter(|id| in_flight.contains_key(id)),
            );
            self.state.favorites().replace_all(next)
        })?;
        for listing_id in &diff.added {
            self.state.bus().publish(listing_id, true);
        }
        for listing_id in &diff.removed {
            self.state.bus().publish(listing_id, false);
        }

        Ok(Some(diff))
    }

    /// Ask the server about one listing and correct the cache if needed.
    ///
    /// Returns the server's answer, or `None` if it was not consulted.
    pub async fn refresh(&self, listing_id: &ListingId) -> SyncResult<Option<bool>> {
        let Some(user_id) = self.state.identity().user_id() else {
            return Ok(None);
        };

        if self.pending.is_pending(listing_id) {
            debug!("Skipping refresh of {listing_id}, toggle in flight");
            return Ok(None);
        }

        let liked = match self.favorites.is_favorite(listing_id).await {
            Ok(liked) => liked,
            Err(e) => {
                warn!("Could not check favorite {listing_id}: {e}");
                return Ok(None);
            }
        };

        if self.state.identity().user_id() != Some(user_id) || self.pending.is_pending(listing_id)
        {
            return Ok(None);
        }

        self.state.set_liked(listing_id, liked)?;
        Ok(Some(liked))
    }

    /// Undo an optimistic change after the server said "not signed in".
    ///
    /// Skipped when the user has changed or gone since the toggle started:
    /// the cache no longer belongs to the user the toggle was made for.
    fn roll_back(
        &self,
        listing_id: &ListingId,
        user_id: i64,
        previous: bool,
        desired: bool,
    ) -> SyncResult<()> {
        if self.state.identity().user_id() != Some(user_id) {
            info!("Identity changed before {listing_id} was rejected, not restoring");
            return Ok(());
        }

        if self.state.is_liked(listing_id) != desired {
            return Ok(());
        }

        info!("Server rejected {listing_id} as unauthenticated, restoring {previous}");
        self.state.set_liked(listing_id, previous)?;
        Ok(())
    }

    fn signal_auth_required(&self, listing_id: &ListingId) {
        let handlers: Vec<AuthRequiredHandler> = lock(&self.auth_required).clone();
        for handler in handlers {
            handler(listing_id);
        }
    }
}
