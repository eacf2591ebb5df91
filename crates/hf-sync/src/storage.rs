//! Named JSON entries that survive a restart.
//!
//! Each cache owns exactly one entry. Writes replace the whole entry, so a
//! reader never observes a half-written value.

use crate::{SyncError, SyncResult, lock};

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

pub const IDENTITY_KEY: &str = "identity";
pub const FAVORITES_KEY: &str = "favorites";
pub const SESSION_KEY: &str = "session";

const DATE_FORMAT: &str = "%Y%m%d_%H%M%S";

pub trait KeyValueStore: Send + Sync {
    /// `None` when the entry has never been written or was removed.
    fn read(&self, key: &str) -> SyncResult<Option<String>>;

    fn write(&self, key: &str, contents: &str) -> SyncResult<()>;

    /// Removing a missing entry is not an error.
    fn remove(&self, key: &str) -> SyncResult<()>;

    /// Move an unreadable entry out of the way, keeping it for inspection.
    ///
    /// Returns the name it was moved to, or `None` if there was nothing to move.
    fn quarantine(&self, key: &str) -> SyncResult<Option<String>>;
}

/// One `<key>.json` file per entry in a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the state directory.
    pub fn open(dir: impl Into<PathBuf>) -> SyncResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SyncError::storage("*", dir.clone(), e))?;
        debug!("Opened state directory {dir:?}");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> SyncResult<Option<String>> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::storage(key, path, e)),
        }
    }

    /// Temp file, fsync, then atomic rename over the old entry.
    fn write(&self, key: &str, contents: &str) -> SyncResult<()> {
        let final_path = self.entry_path(key);
        let temp_path = self
            .dir
            .join(format!("{key}.json.tmp.{}", std::process::id()));

        {
            let mut file = fs::File::create(&temp_path)
                .map_err(|e| SyncError::storage(key, temp_path.clone(), e))?;

            file.write_all(contents.as_bytes())
                .map_err(|e| SyncError::storage(key, temp_path.clone(), e))?;

            file.sync_all()
                .map_err(|e| SyncError::storage(key, temp_path.clone(), e))?;
        }

        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            SyncError::storage(key, final_path.clone(), e)
        })?;

        debug!("Wrote entry {key} ({} bytes)", contents.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> SyncResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed entry {key}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::storage(key, path, e)),
        }
    }

    /// Renames `<key>.json` to `<key>.json.corrupted.{timestamp}`.
    fn quarantine(&self, key: &str) -> SyncResult<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let timestamp = chrono::Utc::now().format(DATE_FORMAT);
        let backup_name = format!("{key}.json.corrupted.{timestamp}");
        let backup_path = self.dir.join(&backup_name);

        fs::rename(&path, &backup_path).map_err(|e| SyncError::storage(key, path, e))?;

        warn!("Backed up corrupted entry {key} to {backup_path:?}");
        Ok(Some(backup_name))
    }
}

/// Process-local store for tests and runs that should leave nothing behind.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quarantined: Mutex<Vec<(String, String)>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `write` and `remove` fail, as a full disk would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Entries moved aside by `quarantine`, as `(name, contents)`.
    pub fn quarantined(&self) -> Vec<(String, String)> {
        lock(&self.quarantined).clone()
    }

    fn check_writable(&self, key: &str) -> SyncResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::storage(
                key,
                PathBuf::from(key),
                std::io::Error::other("writes disabled"),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> SyncResult<()> {
        self.check_writable(key)?;
        lock(&self.entries).insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SyncResult<()> {
        self.check_writable(key)?;
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn quarantine(&self, key: &str) -> SyncResult<Option<String>> {
        let Some(contents) = lock(&self.entries).remove(key) else {
            return Ok(None);
        };

        let mut quarantined = lock(&self.quarantined);
        let name = format!("{key}.corrupted.{}", quarantined.len());
        quarantined.push((name.clone(), contents));
        Ok(Some(name))
    }
}
