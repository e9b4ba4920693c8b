use crate::{CoreResult, KeyValueStorage, SNAPSHOT_KEY, Snapshot};

use std::sync::Arc;

use tracing::{debug, instrument, warn};

/// The single auto-save slot.
///
/// Holds at most one [`Snapshot`]. Each write replaces the previous value as
/// a whole; unreadable data is reported as absent so startup never fails on
/// a corrupt slot.
#[derive(Clone)]
pub struct SnapshotStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SnapshotStore {
    /// Create a store over `storage`, using the [`SNAPSHOT_KEY`] slot.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Replace the stored snapshot.
    #[track_caller]
    #[instrument(skip(self, snapshot), fields(timestamp = snapshot.timestamp))]
    pub fn write(&self, snapshot: &Snapshot) -> CoreResult<()> {
        let json = serde_json::to_string(snapshot)?;
        self.storage.set(SNAPSHOT_KEY, &json)?;

        debug!(
            duration_secs = snapshot.duration,
            content_len = snapshot.content.len(),
            "Snapshot written"
        );

        Ok(())
    }

    /// Read the stored snapshot. Missing, unreadable or malformed data is `None`.
    #[instrument(skip(self))]
    pub fn read(&self) -> Option<Snapshot> {
        let raw = match self.storage.get(SNAPSHOT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = ?e, "Failed to read snapshot slot, treating as empty");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Malformed snapshot in slot, treating as empty");
                None
            }
        }
    }

    /// Remove the stored snapshot. Clearing an empty slot succeeds.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn clear(&self) -> CoreResult<()> {
        self.storage.remove(SNAPSHOT_KEY)?;
        debug!("Snapshot slot cleared");
        Ok(())
    }

    /// Whether the slot holds a readable snapshot.
    pub fn exists(&self) -> bool {
        self.read().is_some()
    }
}
