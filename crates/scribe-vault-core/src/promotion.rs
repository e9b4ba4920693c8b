//! Promotion of finished transcriptions into history, with duplicate
//! suppression.

use crate::{HistoryStore, NewTranscription, TranscriptionId};

use tracing::{info, instrument};

/// Two results with identical content stamped within this many milliseconds
/// of each other are the same transcription.
pub const DEDUP_WINDOW_MS: i64 = 60_000;

/// Result of moving a finished transcription into history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// The result was stored under this id.
    Promoted(TranscriptionId),
    /// An equivalent entry already existed; nothing new was stored.
    Duplicate(TranscriptionId),
}

impl Promotion {
    /// Id of the entry holding the result.
    pub fn id(self) -> TranscriptionId {
        match self {
            Promotion::Promoted(id) | Promotion::Duplicate(id) => id,
        }
    }

    /// Whether a new entry was written.
    pub fn is_new(self) -> bool {
        matches!(self, Promotion::Promoted(_))
    }
}

/// Existing entry that makes `content` at `timestamp` a duplicate, if any.
pub fn find_duplicate(
    history: &HistoryStore,
    content: &str,
    timestamp: i64,
    exclude: Option<TranscriptionId>,
) -> Option<TranscriptionId> {
    history.find_duplicate(content, timestamp, DEDUP_WINDOW_MS, exclude)
}

/// Add a finished transcription to history unless an equivalent entry
/// already exists.
#[instrument(skip(history, new), fields(title = %new.title, timestamp = new.timestamp))]
pub fn promote(history: &HistoryStore, new: NewTranscription) -> Promotion {
    if let Some(existing) = find_duplicate(history, &new.content, new.timestamp, None) {
        info!(existing = %existing, "Duplicate promotion skipped");
        return Promotion::Duplicate(existing);
    }

    Promotion::Promoted(history.add(new))
}
