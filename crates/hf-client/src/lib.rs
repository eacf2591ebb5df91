//! Clients for the two server-side authorities the local caches defer to:
//! the session store ("who am I") and the favorites relation ("what have I liked").

pub(crate) mod authority;
pub(crate) mod error;
pub(crate) mod http;
pub(crate) mod memory;

pub use authority::{
    FavoriteAck, FavoritesAuthority, LoginOutcome, RejectReason, SessionAuthority, SessionStatus,
};
pub use error::{ClientError, Result as ClientResult};
pub use http::HttpAuthority;
pub use memory::{InMemoryAuthority, InjectedFailure, Operation};

/// Message the favorites endpoints use for an anonymous caller.
pub const NOT_LOGGED_IN_MESSAGE: &str = "User not logged in";
