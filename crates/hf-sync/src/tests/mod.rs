mod engine;
mod session;
mod toggle;

use crate::{LocalState, MemoryStore, NotificationBus, Subscription};

use hf_client::InMemoryAuthority;
use hf_core::{Identity, ListingId};

use std::sync::{Arc, Mutex};

pub(crate) fn ann() -> Identity {
    Identity::new(5, "a@b.com")
}

/// Local state on a memory store plus an authority that knows `ann`.
pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub state: Arc<LocalState>,
    pub authority: Arc<InMemoryAuthority>,
}

impl Fixture {
    pub fn anonymous() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(LocalState::new(store.clone()));
        let authority = Arc::new(InMemoryAuthority::new().with_account(ann(), "secret"));
        Self {
            store,
            state,
            authority,
        }
    }

    /// `ann` known locally and signed in on the server.
    pub fn signed_in() -> Self {
        let fixture = Self::anonymous();
        fixture.state.identity().set(ann()).unwrap();
        fixture.authority.sign_in_as(ann().id);
        fixture
    }

    /// `ann` known locally, but the server session has expired.
    pub fn stale_session() -> Self {
        let fixture = Self::anonymous();
        fixture.state.identity().set(ann()).unwrap();
        fixture
    }
}

pub(crate) fn listing(raw: &str) -> ListingId {
    ListingId::parse(raw).unwrap()
}

/// Record every state published for `listing_id`.
pub(crate) fn record(
    bus: &NotificationBus,
    listing_id: &ListingId,
) -> (Subscription, Arc<Mutex<Vec<bool>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = bus.subscribe(listing_id, move |_, liked| {
        sink.lock().unwrap().push(liked);
    });
    (subscription, seen)
}

/// Let spawned tasks run until `done` holds, or give up after a few rounds.
pub(crate) async fn settle(done: impl Fn() -> bool) {
    for _ in 0..20 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
}
