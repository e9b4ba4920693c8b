use crate::{RecordingStatus, SaveFormat};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque identifier of a history entry. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranscriptionId(Uuid);

impl TranscriptionId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID, e.g. one typed by the user.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TranscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TranscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Descriptive attributes shared by snapshots and history entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionMetadata {
    /// Spoken language, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Recognition model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Free-form audio quality label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_quality: Option<String>,
    /// Size of the source audio in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Capture device description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    /// True only for entries produced from an auto-save snapshot.
    #[serde(default)]
    pub is_auto_saved: bool,
    /// Attributes this crate does not interpret; preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A durable history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTranscription {
    /// Unique identifier assigned at creation.
    pub id: TranscriptionId,
    /// Creation instant, epoch milliseconds.
    pub timestamp: i64,
    /// Human label.
    pub title: String,
    /// Recording length in seconds.
    pub duration: f64,
    /// Export format.
    pub format: SaveFormat,
    /// Transcript text.
    pub content: String,
    /// Lifecycle status.
    pub status: RecordingStatus,
    /// Descriptive attributes.
    pub metadata: TranscriptionMetadata,
}

/// Everything needed to create a [`SavedTranscription`] except its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTranscription {
    /// Creation instant, epoch milliseconds.
    pub timestamp: i64,
    /// Human label.
    pub title: String,
    /// Recording length in seconds.
    pub duration: f64,
    /// Export format.
    pub format: SaveFormat,
    /// Transcript text.
    pub content: String,
    /// Initial status.
    pub status: RecordingStatus,
    /// Descriptive attributes. `is_auto_saved` is overwritten by the store.
    pub metadata: TranscriptionMetadata,
}

impl NewTranscription {
    pub(crate) fn into_saved(self, id: TranscriptionId, is_auto_saved: bool) -> SavedTranscription {
        let mut metadata = self.metadata;
        metadata.is_auto_saved = is_auto_saved;

        SavedTranscription {
            id,
            timestamp: self.timestamp,
            title: self.title,
            duration: self.duration,
            format: self.format,
            content: self.content,
            status: self.status,
            metadata,
        }
    }
}

/// Partial update merged into an existing entry. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptionPatch {
    /// New creation instant.
    pub timestamp: Option<i64>,
    /// New title.
    pub title: Option<String>,
    /// New duration in seconds.
    pub duration: Option<f64>,
    /// New export format.
    pub format: Option<SaveFormat>,
    /// New transcript text.
    pub content: Option<String>,
    /// New status, applied without transition checks.
    pub status: Option<RecordingStatus>,
    /// Replacement metadata.
    pub metadata: Option<TranscriptionMetadata>,
}

impl TranscriptionPatch {
    /// Patch that only changes the status.
    pub fn status(status: RecordingStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn apply_to(self, entry: &mut SavedTranscription) {
        if let Some(timestamp) = self.timestamp {
            entry.timestamp = timestamp;
        }
        if let Some(title) = self.title {
            entry.title = title;
        }
        if let Some(duration) = self.duration {
            entry.duration = duration;
        }
        if let Some(format) = self.format {
            entry.format = format;
        }
        if let Some(content) = self.content {
            entry.content = content;
        }
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(metadata) = self.metadata {
            entry.metadata = metadata;
        }
    }
}
