use crate::{
    AutosaveScheduler, AutosaveSettings, HistoryStore, NewTranscription, RecordingStatus,
    SaveFormat, Snapshot, TranscriptionId, promotion,
};

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::{Local, TimeZone};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Result of [`RecoveryCoordinator::recover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The snapshot was promoted into a new history entry.
    Recovered(TranscriptionId),
    /// History already held the same transcription; the slot was cleared.
    AlreadyPresent(TranscriptionId),
    /// No snapshot was on offer.
    NothingToRecover,
}

/// Offers an abandoned snapshot found at startup as a recover/discard
/// decision.
///
/// Construct once at startup, before any recording starts. The slot is read
/// only then: snapshots written later by this process are never offered, and
/// the slot is cleared only while it still holds the offered snapshot. Either
/// action resolves the offer for the lifetime of the coordinator.
pub struct RecoveryCoordinator {
    scheduler: Arc<AutosaveScheduler>,
    history: Arc<HistoryStore>,
    settings: watch::Receiver<AutosaveSettings>,
    /// Slot contents at startup.
    offered: Option<Snapshot>,
    /// Entry left `recording`/`processing` by the previous process.
    stale_entry: Option<TranscriptionId>,
    resolved: AtomicBool,
}

impl RecoveryCoordinator {
    /// Create a coordinator, reading the snapshot slot and noting any active
    /// entry left by the previous process.
    #[instrument(skip_all)]
    pub fn new(
        scheduler: Arc<AutosaveScheduler>,
        history: Arc<HistoryStore>,
        settings: watch::Receiver<AutosaveSettings>,
    ) -> Self {
        let stale_entry = history.find_active().map(|entry| {
            info!(id = %entry.id, status = %entry.status, "Found unfinished recording from previous run");
            entry.id
        });

        let offered = scheduler.last_snapshot();
        if let Some(snapshot) = &offered {
            info!(timestamp = snapshot.timestamp, "Found auto-saved recording from previous run");
        }

        Self {
            scheduler,
            history,
            settings,
            offered,
            stale_entry,
            resolved: AtomicBool::new(false),
        }
    }

    /// Snapshot awaiting a decision, if any.
    pub fn check_for_recoverable(&self) -> Option<Snapshot> {
        if self.resolved.load(Ordering::Acquire) {
            return None;
        }
        self.offered.clone()
    }

    /// Entry left active by the previous process, if any.
    pub fn stale_entry(&self) -> Option<TranscriptionId> {
        self.stale_entry
    }

    /// Promote the snapshot into history as a completed, auto-saved entry and
    /// clear the slot.
    ///
    /// With no snapshot on offer, the stale entry (if any) is marked `failed`
    /// as by [`RecoveryCoordinator::discard`].
    #[instrument(skip(self))]
    pub fn recover(&self) -> RecoveryOutcome {
        if self.resolved.swap(true, Ordering::AcqRel) {
            debug!("Recovery already resolved");
            return RecoveryOutcome::NothingToRecover;
        }

        let Some(snapshot) = self.offered.clone() else {
            debug!("No snapshot to recover");
            self.fail_stale_entry();
            return RecoveryOutcome::NothingToRecover;
        };

        let outcome = match promotion::find_duplicate(
            &self.history,
            &snapshot.content,
            snapshot.timestamp,
            self.stale_entry,
        ) {
            Some(existing) => {
                info!(existing = %existing, "Snapshot already in history");
                RecoveryOutcome::AlreadyPresent(existing)
            }
            None => {
                let new = recovered_entry(snapshot, self.settings.borrow().save_format);
                RecoveryOutcome::Recovered(self.history.add_recovered(new))
            }
        };

        if let Some(stale) = self.stale_entry {
            self.history.remove(stale);
            debug!(id = %stale, "Superseded unfinished entry removed");
        }

        self.clear_slot();

        info!(?outcome, "Auto-saved recording recovered");

        outcome
    }

    /// Clear the slot without touching history content.
    ///
    /// Returns `false` if the offer was already resolved.
    #[instrument(skip(self))]
    pub fn discard(&self) -> bool {
        if self.resolved.swap(true, Ordering::AcqRel) {
            debug!("Recovery already resolved");
            return false;
        }

        self.fail_stale_entry();
        self.clear_slot();

        info!("Auto-saved recording discarded");

        true
    }

    fn fail_stale_entry(&self) {
        if let Some(stale) = self.stale_entry {
            if let Err(e) = self.history.set_status(stale, RecordingStatus::Failed) {
                warn!(id = %stale, error = ?e, "Failed to mark abandoned entry as failed");
            }
        }
    }

    /// Clear the slot if it still holds the offered snapshot. A recording
    /// started since then owns the slot.
    fn clear_slot(&self) {
        let Some(offered) = &self.offered else {
            return;
        };

        if self.scheduler.last_snapshot().as_ref() != Some(offered) {
            debug!("Slot rewritten by a later recording, left in place");
            return;
        }

        if let Err(e) = self.scheduler.store().clear() {
            warn!(error = ?e, "Failed to clear snapshot slot");
        }
    }
}

fn recovered_entry(snapshot: Snapshot, format: SaveFormat) -> NewTranscription {
    let taken_at = Local
        .timestamp_millis_opt(snapshot.timestamp)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| snapshot.timestamp.to_string());

    NewTranscription {
        timestamp: snapshot.timestamp,
        title: format!("Recovered transcription {}", taken_at),
        duration: snapshot.duration,
        format,
        content: snapshot.content,
        status: RecordingStatus::Completed,
        metadata: snapshot.metadata,
    }
}
