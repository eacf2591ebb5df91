use hf_client::ClientError;
use hf_core::CoreError;

use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors surfaced by the local state layer.
///
/// Collaborator failures are normally absorbed by the reconciler and the
/// toggle controller; `Client` only escapes from explicit user actions such
/// as login.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Storage error for entry {key} at {path}: {source} {location}")]
    Storage {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to serialize local state: {source} {location}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Invalid input: {source} {location}")]
    Validation {
        #[source]
        source: CoreError,
        location: ErrorLocation,
    },

    #[error("Authority request failed: {source} {location}")]
    Client {
        #[source]
        source: ClientError,
        location: ErrorLocation,
    },
}

impl SyncError {
    #[track_caller]
    pub fn storage(key: impl Into<String>, path: PathBuf, source: std::io::Error) -> Self {
        Self::Storage {
            key: key.into(),
            path,
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the failure came from a collaborator that may answer later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Client { source, .. } => source.is_transient(),
            Self::Storage { .. } => true,
            Self::Serialization { .. } | Self::Validation { .. } => false,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for SyncError {
    #[track_caller]
    fn from(source: CoreError) -> Self {
        Self::Validation {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ClientError> for SyncError {
    #[track_caller]
    fn from(source: ClientError) -> Self {
        Self::Client {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
