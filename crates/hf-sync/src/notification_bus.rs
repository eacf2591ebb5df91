use crate::lock;

use hf_core::ListingId;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use log::debug;

/// Handler invoked with the listing and its new like-state.
pub type FavoriteHandler = Arc<dyn Fn(&ListingId, bool) + Send + Sync>;

/// Synchronous per-listing publish/subscribe channel.
///
/// Handlers run on the publishing thread, in registration order, before
/// `publish` returns. Nothing is persisted and there is no ordering across
/// different listings.
#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<Mutex<BusInner>>,
}

#[derive(Default)]
struct BusInner {
    channels: HashMap<ListingId, Vec<HandlerEntry>>,
    next_id: u64,
}

struct HandlerEntry {
    id: u64,
    handler: FavoriteHandler,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for one listing.
    ///
    /// The handler stays registered until the returned `Subscription` is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, listing_id: &ListingId, handler: F) -> Subscription
    where
        F: Fn(&ListingId, bool) + Send + Sync + 'static,
    {
        let mut inner = lock(&self.inner);

        let id = inner.next_id;
        inner.next_id += 1;

        let channel = inner.channels.entry(listing_id.clone()).or_default();
        channel.push(HandlerEntry {
            id,
            handler: Arc::new(handler),
        });

        debug!(
            "Subscribed to listing {listing_id} ({} total subscribers)",
            channel.len()
        );

        Subscription {
            bus: Arc::downgrade(&self.inner),
            listing_id: listing_id.clone(),
            id,
        }
    }

    /// Invoke every handler registered for `listing_id`; returns how many ran.
    ///
    /// The handler list is copied before any handler runs, so handlers may
    /// subscribe or unsubscribe without deadlocking. Such changes take effect
    /// from the next publish.
    pub fn publish(&self, listing_id: &ListingId, liked: bool) -> usize {
        let handlers: Vec<FavoriteHandler> = {
            let inner = lock(&self.inner);
            match inner.channels.get(listing_id) {
                Some(channel) => channel.iter().map(|r| Arc::clone(&r.handler)).collect(),
                None => {
                    debug!("No subscribers for listing {listing_id}");
                    return 0;
                }
            }
        };

        for handler in &handlers {
            handler(listing_id, liked);
        }

        debug!(
            "Published {liked} for listing {listing_id} ({} handlers)",
            handlers.len()
        );
        handlers.len()
    }

    pub fn subscriber_count(&self, listing_id: &ListingId) -> usize {
        lock(&self.inner)
            .channels
            .get(listing_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of listings with at least one subscriber.
    pub fn channel_count(&self) -> usize {
        lock(&self.inner).channels.len()
    }
}

/// Handle returned by [`NotificationBus::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<Mutex<BusInner>>,
    listing_id: ListingId,
    id: u64,
}

impl Subscription {
    pub fn listing_id(&self) -> &ListingId {
        &self.listing_id
    }

    pub fn unsubscribe(self) {
        // Drop does the work
    }

    fn detach(&self) {
        let Some(shared) = self.bus.upgrade() else {
            return;
        };
        let mut inner = lock(&shared);

        let Some(channel) = inner.channels.get_mut(&self.listing_id) else {
            return;
        };
        channel.retain(|r| r.id != self.id);

        debug!(
            "Unsubscribed from listing {} ({} remaining subscribers)",
            self.listing_id,
            channel.len()
        );

        if channel.is_empty() {
            inner.channels.remove(&self.listing_id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
