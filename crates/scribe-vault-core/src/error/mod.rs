use crate::RecordingStatus;

use std::{panic::Location, result::Result as StdResult};

use error_location::ErrorLocation;
use thiserror::Error;

/// Persistence and lifecycle errors with source location tracking.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The storage medium rejected a read, write or removal.
    #[error("Storage error for key '{key}': {reason} {location}")]
    Storage {
        /// Storage key the operation targeted.
        key: String,
        /// Description of the failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A value could not be serialized for storage.
    #[error("Serialization failed: {source} {location}")]
    Serialization {
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A status change that the recording state machine does not allow.
    #[error("Invalid status transition from {from} to {to} {location}")]
    InvalidTransition {
        /// Current status of the entry.
        from: RecordingStatus,
        /// Requested status.
        to: RecordingStatus,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Promotion attempted while the transcriber is still streaming output.
    #[error("Transcription is still in progress {location}")]
    TranscriptionBusy {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<serde_json::Error> for VaultError {
    #[track_caller]
    fn from(source: serde_json::Error) -> Self {
        VaultError::Serialization {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::io::Error> for VaultError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        VaultError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`VaultError`].
pub type Result<T> = StdResult<T, VaultError>;
