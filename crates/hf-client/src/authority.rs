use crate::ClientResult;

use hf_core::{Credentials, FavoriteListing, Identity, ListingId, Registration};

use async_trait::async_trait;

/// Authoritative answer to "is this visitor logged in".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    LoggedIn(Identity),
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Identity),
    /// Credentials refused; `message` is safe to show to the user.
    Rejected { message: String },
}

/// Why the favorites authority refused a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotAuthenticated,
    ServerError(String),
}

/// Response to an add/remove favorite request that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteAck {
    Applied,
    Rejected(RejectReason),
}

impl FavoriteAck {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Server-side store mapping the session cookie to a user.
///
/// `validate_session` is polled, so implementations must keep it cheap and
/// free of side effects. An `Err` never means "logged out".
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    async fn validate_session(&self) -> ClientResult<SessionStatus>;

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginOutcome>;

    async fn register(&self, registration: &Registration) -> ClientResult<LoginOutcome>;

    async fn logout(&self) -> ClientResult<()>;
}

/// Server-side `(user, listing)` like relation.
///
/// Adding an existing favorite or removing a missing one reports `Applied`.
#[async_trait]
pub trait FavoritesAuthority: Send + Sync {
    async fn is_favorite(&self, listing_id: &ListingId) -> ClientResult<bool>;

    async fn add_favorite(&self, listing_id: &ListingId) -> ClientResult<FavoriteAck>;

    async fn remove_favorite(&self, listing_id: &ListingId) -> ClientResult<FavoriteAck>;

    /// Most recently liked first.
    async fn list_favorites(&self) -> ClientResult<Vec<FavoriteListing>>;
}
