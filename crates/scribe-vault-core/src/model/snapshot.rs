use crate::TranscriptionMetadata;

use serde::{Deserialize, Serialize};

/// The single in-flight auto-save record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Instant the snapshot was taken, epoch milliseconds.
    pub timestamp: i64,
    /// Recording length at snapshot time, in seconds.
    pub duration: f64,
    /// Best-effort transcript so far. May be empty.
    #[serde(default)]
    pub content: String,
    /// Descriptive attributes. `is_auto_saved` is always true.
    pub metadata: TranscriptionMetadata,
}

impl Snapshot {
    /// Build a snapshot, marking its metadata as auto-saved.
    pub fn new(
        timestamp: i64,
        duration: f64,
        content: impl Into<String>,
        metadata: TranscriptionMetadata,
    ) -> Self {
        Self {
            timestamp,
            duration,
            content: content.into(),
            metadata: TranscriptionMetadata {
                is_auto_saved: true,
                ..metadata
            },
        }
    }
}
