use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a recording and its history entry.
///
/// Transitions follow a fixed graph:
///
/// ```text
/// recording ──► processing ──► completed
///     │             │   ▲
///     │             ▼   │ (retry)
///     ├────────► failed ┘
///     └────────► completed
/// ```
///
/// `completed` is final. Writing the current status again is always accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    /// Audio is being captured.
    Recording,
    /// Capture ended without finalisation; a recoverable snapshot exists.
    Processing,
    /// Transcription finished and was promoted into history.
    Completed,
    /// Work ended and cannot be recovered.
    Failed,
}

impl RecordingStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: RecordingStatus) -> bool {
        use RecordingStatus::*;

        if self == next {
            return true;
        }

        matches!(
            (self, next),
            (Recording, Processing | Completed | Failed)
                | (Processing, Completed | Failed)
                | (Failed, Processing)
        )
    }

    /// `recording` or `processing`: work that has not been finalised.
    pub fn is_active(self) -> bool {
        matches!(self, RecordingStatus::Recording | RecordingStatus::Processing)
    }

    /// `completed` or `failed`: statuses teardown logic never advances.
    pub fn is_terminal(self) -> bool {
        matches!(self, RecordingStatus::Completed | RecordingStatus::Failed)
    }

    /// Lowercase name as stored on disk.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordingStatus::Recording => "recording",
            RecordingStatus::Processing => "processing",
            RecordingStatus::Completed => "completed",
            RecordingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
