use crate::{AutosaveSettings, CoreResult, HistoryStore, RecordingStatus, TranscriptionId};

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Hands out [`StatusGuard`]s for active recordings.
#[derive(Clone)]
pub struct StatusTracker {
    history: Arc<HistoryStore>,
    settings: watch::Receiver<AutosaveSettings>,
}

impl StatusTracker {
    /// Create a tracker writing to `history` and reading the auto-save flag
    /// from `settings`.
    pub fn new(history: Arc<HistoryStore>, settings: watch::Receiver<AutosaveSettings>) -> Self {
        Self { history, settings }
    }

    /// Status a recording receives when its flow ends without an explicit
    /// terminal resolution.
    pub fn teardown_status(auto_save_enabled: bool) -> RecordingStatus {
        if auto_save_enabled {
            RecordingStatus::Processing
        } else {
            RecordingStatus::Failed
        }
    }

    /// Mark `id` as `recording` and return the guard owning its status.
    ///
    /// An unknown `id` yields a guard whose operations are no-ops.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn track(&self, id: TranscriptionId) -> CoreResult<StatusGuard> {
        if !self.history.set_status(id, RecordingStatus::Recording)? {
            warn!(id = %id, "Tracking a recording with no history entry");
        }

        debug!(id = %id, "Recording status tracked");

        Ok(StatusGuard {
            id,
            history: Arc::clone(&self.history),
            settings: self.settings.clone(),
            resolved: false,
        })
    }
}

/// Owns the status of one recording while it is active.
///
/// Dropping the guard without [`StatusGuard::resolve`] applies the teardown
/// decision exactly once: `processing` if auto-save is enabled at that moment,
/// otherwise `failed`. Entries that already reached a terminal status are left
/// alone.
pub struct StatusGuard {
    id: TranscriptionId,
    history: Arc<HistoryStore>,
    settings: watch::Receiver<AutosaveSettings>,
    resolved: bool,
}

impl StatusGuard {
    /// Identifier of the tracked entry.
    pub fn id(&self) -> TranscriptionId {
        self.id
    }

    /// Apply an explicit status while the recording is still active.
    #[track_caller]
    pub fn set_status(&self, status: RecordingStatus) -> CoreResult<bool> {
        self.history.set_status(self.id, status)
    }

    /// Apply the final status and release the guard.
    ///
    /// If the transition is rejected the error is returned and the teardown
    /// decision still runs on drop.
    #[track_caller]
    #[instrument(skip(self), fields(id = %self.id))]
    pub fn resolve(mut self, status: RecordingStatus) -> CoreResult<()> {
        self.history.set_status(self.id, status)?;
        self.resolved = true;
        Ok(())
    }
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }

        match self.history.get(self.id) {
            Some(entry) if entry.status.is_terminal() => {
                debug!(id = %self.id, status = %entry.status, "Recording already finalised");
                return;
            }
            Some(_) => {}
            None => return,
        }

        let auto_save_enabled = self.settings.borrow().enabled;
        let status = StatusTracker::teardown_status(auto_save_enabled);

        match self.history.set_status(self.id, status) {
            Ok(_) => info!(
                id = %self.id,
                status = %status,
                auto_save_enabled,
                "Recording ended without finalisation"
            ),
            Err(e) => warn!(id = %self.id, error = ?e, "Failed to apply teardown status"),
        }
    }
}
