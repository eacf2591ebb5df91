use crate::storage::{FAVORITES_KEY, KeyValueStore};
use crate::{SyncResult, lock};

use hf_core::ListingId;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

/// Membership changes produced by a bulk replace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesDiff {
    pub added: Vec<ListingId>,
    pub removed: Vec<ListingId>,
}

impl FavoritesDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Persisted set of listings the current visitor believes are liked.
///
/// Stored as a sorted JSON array. Same write-through rule as the identity
/// cache.
pub struct LocalFavoritesCache {
    store: Arc<dyn KeyValueStore>,
    members: Mutex<BTreeSet<ListingId>>,
}

impl LocalFavoritesCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            members: Mutex::new(BTreeSet::new()),
        }
    }

    /// Hydrate from the store, returning the number of liked listings.
    pub fn load(&self) -> SyncResult<usize> {
        let mut members = lock(&self.members);

        let loaded = match self.store.read(FAVORITES_KEY)? {
            None => BTreeSet::new(),
            Some(contents) => match serde_json::from_str::<BTreeSet<ListingId>>(&contents) {
                Ok(loaded) => loaded,
                Err(e) => {
                    warn!("Persisted favorites corrupted: {e}");
                    self.store.quarantine(FAVORITES_KEY)?;
                    BTreeSet::new()
                }
            },
        };

        info!("Loaded {} favorites", loaded.len());
        *members = loaded;
        Ok(members.len())
    }

    pub fn contains(&self, listing_id: &ListingId) -> bool {
        lock(&self.members).contains(listing_id)
    }

    /// Returns `true` if the listing was not already liked.
    pub fn insert(&self, listing_id: &ListingId) -> SyncResult<bool> {
        self.set(listing_id, true)
    }

    /// Returns `true` if the listing was liked.
    pub fn remove(&self, listing_id: &ListingId) -> SyncResult<bool> {
        self.set(listing_id, false)
    }

    /// Set one listing's membership; returns whether anything changed.
    pub fn set(&self, listing_id: &ListingId, liked: bool) -> SyncResult<bool> {
        let mut members = lock(&self.members);

        if members.contains(listing_id) == liked {
            return Ok(false);
        }

        let mut next = members.clone();
        if liked {
            next.insert(listing_id.clone());
        } else {
            next.remove(listing_id);
        }

        self.persist(&next)?;
        *members = next;

        debug!("Favorite {listing_id} set to {liked}");
        Ok(true)
    }

    /// Replace the whole set, reporting which listings changed.
    pub fn replace_all<I>(&self, listing_ids: I) -> SyncResult<FavoritesDiff>
    where
        I: IntoIterator<Item = ListingId>,
    {
        let mut members = lock(&self.members);
        let next: BTreeSet<ListingId> = listing_ids.into_iter().collect();

        let diff = FavoritesDiff {
            added: next.difference(&members).cloned().collect(),
            removed: members.difference(&next).cloned().collect(),
        };

        if diff.is_empty() {
            return Ok(diff);
        }

        self.persist(&next)?;
        *members = next;

        info!(
            "Favorites replaced: {} added, {} removed",
            diff.added.len(),
            diff.removed.len()
        );
        Ok(diff)
    }

    /// Empty the set, returning the listings that were liked.
    pub fn clear(&self) -> SyncResult<Vec<ListingId>> {
        let mut members = lock(&self.members);

        self.store.remove(FAVORITES_KEY)?;
        let previous = std::mem::take(&mut *members);

        if !previous.is_empty() {
            info!("Cleared {} favorites", previous.len());
        }
        Ok(previous.into_iter().collect())
    }

    /// Liked listings in sorted order.
    pub fn snapshot(&self) -> Vec<ListingId> {
        lock(&self.members).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.members).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.members).is_empty()
    }

    fn persist(&self, members: &BTreeSet<ListingId>) -> SyncResult<()> {
        let json = serde_json::to_string(members)?;
        self.store.write(FAVORITES_KEY, &json)
    }
}
