use crate::{
    CoreResult, HISTORY_KEY, KeyValueStorage, NewTranscription, RecordingStatus,
    SavedTranscription, TranscriptionId, TranscriptionPatch, VaultError,
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard},
};

use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Durable, newest-first collection of finished transcriptions.
///
/// Construct once per process with [`HistoryStore::load`] and share it as an
/// `Arc<HistoryStore>`. Every mutation writes the whole collection back to
/// storage before returning. A failed write is logged and the in-memory state
/// is kept, so the session keeps working if the medium is unavailable.
pub struct HistoryStore {
    storage: Arc<dyn KeyValueStorage>,
    entries: Mutex<Vec<SavedTranscription>>,
}

impl HistoryStore {
    /// Load the collection from `storage`. Missing or malformed data yields
    /// an empty history.
    #[instrument(skip(storage))]
    pub fn load(storage: Arc<dyn KeyValueStorage>) -> Self {
        let entries = match storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<SavedTranscription>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Malformed history collection, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = ?e, "Failed to read history collection, starting empty");
                Vec::new()
            }
        };

        info!(entries = entries.len(), "History loaded");

        Self {
            storage,
            entries: Mutex::new(entries),
        }
    }

    /// Add a manually created entry.
    ///
    /// `metadata.is_auto_saved` is always stored as `false`, whatever the
    /// caller passed: only [`HistoryStore::add_recovered`] may create
    /// auto-saved entries.
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub fn add(&self, new: NewTranscription) -> TranscriptionId {
        self.insert(new, false)
    }

    /// Add an entry promoted from an auto-save snapshot.
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub fn add_recovered(&self, new: NewTranscription) -> TranscriptionId {
        self.insert(new, true)
    }

    fn insert(&self, new: NewTranscription, is_auto_saved: bool) -> TranscriptionId {
        let id = TranscriptionId::new();
        let entry = new.into_saved(id, is_auto_saved);
        let status = entry.status;

        let mut entries = self.entries();
        entries.insert(0, entry);
        self.persist(&entries);

        info!(id = %id, status = %status, is_auto_saved, "History entry added");

        id
    }

    /// Merge `patch` into the entry with `id`.
    ///
    /// This is the explicit correction path: a status in the patch is applied
    /// without transition checks. Returns `false` if no such entry exists.
    #[instrument(skip(self, patch))]
    pub fn update(&self, id: TranscriptionId, patch: TranscriptionPatch) -> bool {
        let mut entries = self.entries();

        let Some(entry) = entries.iter_mut().find(|t| t.id == id) else {
            debug!(id = %id, "Update for unknown entry ignored");
            return false;
        };

        patch.apply_to(entry);
        self.persist(&entries);

        debug!(id = %id, "History entry updated");

        true
    }

    /// Move the entry with `id` to `status`, enforcing the transition graph
    /// of [`RecordingStatus`].
    ///
    /// Returns `Ok(false)` if no such entry exists.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn set_status(&self, id: TranscriptionId, status: RecordingStatus) -> CoreResult<bool> {
        let mut entries = self.entries();

        let Some(entry) = entries.iter_mut().find(|t| t.id == id) else {
            debug!(id = %id, "Status change for unknown entry ignored");
            return Ok(false);
        };

        let from = entry.status;
        if !from.can_transition_to(status) {
            return Err(VaultError::InvalidTransition {
                from,
                to: status,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if from != status {
            entry.status = status;
            self.persist(&entries);
            info!(id = %id, from = %from, to = %status, "Recording status changed");
        }

        Ok(true)
    }

    /// Delete the entry with `id`. Returns `false` if no such entry exists.
    #[instrument(skip(self))]
    pub fn remove(&self, id: TranscriptionId) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|t| t.id != id);

        if entries.len() == before {
            debug!(id = %id, "Removal of unknown entry ignored");
            return false;
        }

        self.persist(&entries);
        info!(id = %id, "History entry removed");

        true
    }

    /// Delete every entry.
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let mut entries = self.entries();
        let removed = entries.len();
        entries.clear();
        self.persist(&entries);

        info!(removed, "History cleared");
    }

    /// First entry, in collection order, whose status is `recording` or
    /// `processing`.
    pub fn find_active(&self) -> Option<SavedTranscription> {
        self.entries()
            .iter()
            .find(|t| t.status.is_active())
            .cloned()
    }

    /// Entry with identical `content` whose timestamp lies within
    /// `window_ms` of `timestamp` (inclusive), ignoring `exclude`.
    pub fn find_duplicate(
        &self,
        content: &str,
        timestamp: i64,
        window_ms: i64,
        exclude: Option<TranscriptionId>,
    ) -> Option<TranscriptionId> {
        self.entries()
            .iter()
            .filter(|t| Some(t.id) != exclude)
            .find(|t| t.content == content && (t.timestamp - timestamp).abs() <= window_ms)
            .map(|t| t.id)
    }

    /// Entry with `id`, if present.
    pub fn get(&self, id: TranscriptionId) -> Option<SavedTranscription> {
        self.entries().iter().find(|t| t.id == id).cloned()
    }

    /// All entries, newest first.
    pub fn list(&self) -> Vec<SavedTranscription> {
        self.entries().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the history holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<SavedTranscription>> {
        self.entries.lock().unwrap_or_else(|e| {
            error!("History lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    fn persist(&self, entries: &[SavedTranscription]) {
        let result = serde_json::to_string(entries)
            .map_err(VaultError::from)
            .and_then(|json| self.storage.set(HISTORY_KEY, &json));

        if let Err(e) = result {
            warn!(error = ?e, entries = entries.len(), "Failed to persist history");
        }
    }
}
