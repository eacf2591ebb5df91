use crate::storage::{IDENTITY_KEY, KeyValueStore};
use crate::{SyncResult, lock};

use hf_core::Identity;

use std::sync::{Arc, Mutex};

use log::{info, warn};
use tokio::sync::watch;

/// Persisted mirror of the last known session identity.
///
/// Write-through: the store is updated first and the in-memory value only
/// changes once the write has succeeded, so both always hold the same value.
/// No network I/O happens here.
pub struct LocalIdentityCache {
    store: Arc<dyn KeyValueStore>,
    current: watch::Sender<Option<Identity>>,
    writes: Mutex<()>,
}

impl LocalIdentityCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            store,
            current,
            writes: Mutex::new(()),
        }
    }

    /// Hydrate from the store.
    ///
    /// An unreadable entry is quarantined and treated as absent.
    pub fn load(&self) -> SyncResult<Option<Identity>> {
        let _guard = lock(&self.writes);

        let loaded = match self.store.read(IDENTITY_KEY)? {
            None => {
                info!("No persisted identity (anonymous visitor)");
                None
            }
            Some(contents) => match serde_json::from_str::<Identity>(&contents) {
                Ok(identity) => {
                    info!("Loaded identity for user {}", identity.id);
                    Some(identity)
                }
                Err(e) => {
                    warn!("Persisted identity corrupted: {e}");
                    self.store.quarantine(IDENTITY_KEY)?;
                    None
                }
            },
        };

        self.current.send_replace(loaded.clone());
        Ok(loaded)
    }

    pub fn get(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn is_present(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Id of the current user, if any.
    pub fn user_id(&self) -> Option<i64> {
        self.current.borrow().as_ref().map(|identity| identity.id)
    }

    pub fn set(&self, identity: Identity) -> SyncResult<()> {
        let _guard = lock(&self.writes);

        let json = serde_json::to_string(&identity)?;
        self.store.write(IDENTITY_KEY, &json)?;

        info!("Identity set to user {}", identity.id);
        self.current.send_replace(Some(identity));
        Ok(())
    }

    /// Remove the identity, returning what was there.
    pub fn clear(&self) -> SyncResult<Option<Identity>> {
        let _guard = lock(&self.writes);

        self.store.remove(IDENTITY_KEY)?;

        let previous = self.current.send_replace(None);
        if let Some(previous) = &previous {
            info!("Identity for user {} cleared", previous.id);
        }
        Ok(previous)
    }

    /// Observe identity changes; the receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}
