//! Client-side session and favorites state, kept consistent with the
//! server's session store and favorites relation.
//!
//! The local caches are trusted until the server explicitly says otherwise:
//! failures to reach the server never log anyone out or undo a like.

pub(crate) mod engine;
pub(crate) mod error;
pub(crate) mod favorites_cache;
pub(crate) mod identity_cache;
pub(crate) mod local_state;
pub(crate) mod notification_bus;
pub(crate) mod pending;
pub(crate) mod reconcile;
pub(crate) mod scheduler;
pub(crate) mod session;
pub mod storage;
pub(crate) mod toggle;

pub use engine::{Authorities, SyncEngine};
pub use error::{Result as SyncResult, SyncError};
pub use favorites_cache::{FavoritesDiff, LocalFavoritesCache};
pub use identity_cache::LocalIdentityCache;
pub use local_state::LocalState;
pub use notification_bus::{FavoriteHandler, NotificationBus, Subscription};
pub use pending::{PendingToggle, PendingToggles, ToggleState};
pub use reconcile::{ReconcileOutcome, Reconciler, Trigger, VerificationState};
pub use scheduler::{ReconcileScheduler, ReconcileTriggers, Visibility};
pub use session::SessionManager;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use toggle::{AuthRequiredHandler, ToggleController, ToggleOutcome};

use std::sync::{Mutex, MutexGuard};

/// Lock ignoring poison; every guarded value is replaced whole.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests;
