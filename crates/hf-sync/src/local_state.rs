use crate::storage::KeyValueStore;
use crate::{LocalFavoritesCache, LocalIdentityCache, NotificationBus, SyncResult};

use hf_core::{Identity, ListingId};

use std::sync::Arc;

use log::{info, warn};

/// The process-wide client state: who we are, what we like, and the bus
/// that tells views about like-state changes.
///
/// Built once at bootstrap and shared by reference.
pub struct LocalState {
    identity: LocalIdentityCache,
    favorites: LocalFavoritesCache,
    bus: NotificationBus,
}

impl LocalState {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            identity: LocalIdentityCache::new(Arc::clone(&store)),
            favorites: LocalFavoritesCache::new(store),
            bus: NotificationBus::new(),
        }
    }

    /// Hydrate both caches from the store.
    ///
    /// Favorites left behind without an identity are discarded, since they
    /// cannot be attributed to anyone.
    pub fn load(&self) -> SyncResult<Option<Identity>> {
        let identity = self.identity.load()?;
        let liked = self.favorites.load()?;

        if identity.is_none() && liked > 0 {
            warn!("Discarding {liked} favorites persisted without an identity");
            self.favorites.clear()?;
        }

        Ok(identity)
    }

    pub fn identity(&self) -> &LocalIdentityCache {
        &self.identity
    }

    pub fn favorites(&self) -> &LocalFavoritesCache {
        &self.favorites
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn is_liked(&self, listing_id: &ListingId) -> bool {
        self.favorites.contains(listing_id)
    }

    /// Set one listing's membership and tell subscribers if it changed.
    pub fn set_liked(&self, listing_id: &ListingId, liked: bool) -> SyncResult<bool> {
        let changed = self.favorites.set(listing_id, liked)?;
        if changed {
            self.bus.publish(listing_id, liked);
        }
        Ok(changed)
    }

    /// Adopt `identity` as the current user.
    ///
    /// Favorites belong to a single user, so switching to a different account
    /// drops them first. Returns `true` if favorites were dropped.
    pub fn adopt_identity(&self, identity: Identity) -> SyncResult<bool> {
        let switching = self
            .identity
            .get()
            .is_some_and(|current| !current.same_user(&identity));

        if switching {
            info!("Switching to user {}, dropping favorites", identity.id);
            self.clear_favorites()?;
        }

        self.identity.set(identity)?;
        Ok(switching)
    }

    /// Forget the session: identity and favorites go together.
    ///
    /// Every listing that was liked is published as unliked.
    pub fn clear_session(&self) -> SyncResult<Option<Identity>> {
        self.clear_favorites()?;
        self.identity.clear()
    }

    fn clear_favorites(&self) -> SyncResult<()> {
        for listing_id in self.favorites.clear()? {
            self.bus.publish(&listing_id, false);
        }
        Ok(())
    }
}
