//! In-flight favorite mutations.
//!
//! Each toggle walks `Idle -> Optimistic -> Confirmed | RolledBack | Retained`.
//! While a toggle is registered here, further toggles of the same listing are
//! refused.

use crate::lock;

use hf_core::ListingId;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Idle,
    /// Local state already shows `desired`; the server has not answered yet.
    Optimistic { previous: bool, desired: bool },
    /// Server applied the change.
    Confirmed { liked: bool },
    /// Server refused because the visitor is not signed in; local state is back to `liked`.
    RolledBack { liked: bool },
    /// No answer or a server failure; the optimistic `liked` stays.
    Retained { liked: bool },
}

impl ToggleState {
    /// Flip from the believed current state.
    pub fn start(previous: bool) -> Self {
        Self::Optimistic {
            previous,
            desired: !previous,
        }
    }

    pub fn confirm(self) -> Self {
        match self {
            Self::Optimistic { desired, .. } => Self::Confirmed { liked: desired },
            other => other,
        }
    }

    pub fn roll_back(self) -> Self {
        match self {
            Self::Optimistic { previous, .. } => Self::RolledBack { liked: previous },
            other => other,
        }
    }

    pub fn retain(self) -> Self {
        match self {
            Self::Optimistic { desired, .. } => Self::Retained { liked: desired },
            other => other,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Optimistic { .. })
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Confirmed { .. } | Self::RolledBack { .. } | Self::Retained { .. }
        )
    }
}

/// Registry of listings with a toggle in flight.
#[derive(Clone, Default)]
pub struct PendingToggles {
    inner: Arc<Mutex<HashMap<ListingId, ToggleState>>>,
}

impl PendingToggles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `listing_id`, or `None` if a toggle for it is already in flight.
    pub fn begin(&self, listing_id: &ListingId) -> Option<PendingToggle> {
        let mut inner = lock(&self.inner);
        if inner.contains_key(listing_id) {
            return None;
        }

        inner.insert(listing_id.clone(), ToggleState::Idle);
        Some(PendingToggle {
            registry: Arc::clone(&self.inner),
            listing_id: listing_id.clone(),
            state: ToggleState::Idle,
        })
    }

    pub fn is_pending(&self, listing_id: &ListingId) -> bool {
        lock(&self.inner).contains_key(listing_id)
    }

    /// Run `f` over the in-flight listings while holding the registry, so
    /// no toggle can begin until it returns.
    ///
    /// `f` must not call back into this registry.
    pub fn while_locked<R>(&self, f: impl FnOnce(&HashMap<ListingId, ToggleState>) -> R) -> R {
        let inner = lock(&self.inner);
        f(&inner)
    }

    pub fn state_of(&self, listing_id: &ListingId) -> Option<ToggleState> {
        lock(&self.inner).get(listing_id).copied()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).is_empty()
    }
}

/// Claim on one listing; releases it when dropped.
pub struct PendingToggle {
    registry: Arc<Mutex<HashMap<ListingId, ToggleState>>>,
    listing_id: ListingId,
    state: ToggleState,
}

impl PendingToggle {
    pub fn listing_id(&self) -> &ListingId {
        &self.listing_id
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    /// Record the next state; visible through [`PendingToggles::state_of`].
    pub fn advance(&mut self, next: ToggleState) {
        self.state = next;
        if let Some(slot) = lock(&self.registry).get_mut(&self.listing_id) {
            *slot = next;
        }
    }
}

impl Drop for PendingToggle {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.listing_id);
    }
}
