//! Scribe-vault Core Library
//!
//! Durable lifecycle and recovery for in-progress transcriptions: a single
//! auto-save snapshot slot written on a timer and at teardown, a checked
//! recording status machine, a deduplicated history store, and a coordinator
//! that offers an abandoned snapshot for recovery on the next start.
//!
//! # Example
//!
//! ```no_run
//! use scribe_vault_core::{
//!     AutosaveScheduler, AutosaveSettings, FileStorage, HistoryStore, KeyValueStorage,
//!     RecoveryCoordinator, SnapshotStore, CoreResult, DEFAULT_AUTOSAVE_INTERVAL,
//! };
//!
//! use std::sync::Arc;
//!
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::open("data")?);
//!     let history = Arc::new(HistoryStore::load(Arc::clone(&storage)));
//!
//!     let (_teardown_tx, teardown_rx) = watch::channel(false);
//!     let scheduler = Arc::new(AutosaveScheduler::new(
//!         SnapshotStore::new(storage),
//!         DEFAULT_AUTOSAVE_INTERVAL,
//!         teardown_rx,
//!     ));
//!
//!     let (_settings_tx, settings_rx) = watch::channel(AutosaveSettings::default());
//!     let recovery = RecoveryCoordinator::new(scheduler, Arc::clone(&history), settings_rx);
//!
//!     if let Some(snapshot) = recovery.check_for_recoverable() {
//!         println!("Recovering {} seconds of audio", snapshot.duration);
//!         recovery.recover();
//!     }
//!     Ok(())
//! }
//! ```

mod clock;
mod error;
mod history_store;
mod model;
pub mod promotion;
mod recovery;
mod scheduler;
mod session;
mod settings;
mod snapshot_store;
mod status_tracker;
mod storage;

pub use {
    clock::{Clock, SystemClock},
    error::{Result as CoreResult, VaultError},
    history_store::HistoryStore,
    model::{
        NewTranscription, RecordingStatus, SaveFormat, SavedTranscription, Snapshot,
        TranscriptionId, TranscriptionMetadata, TranscriptionPatch,
    },
    promotion::{DEDUP_WINDOW_MS, Promotion},
    recovery::{RecoveryCoordinator, RecoveryOutcome},
    scheduler::{AutosaveEvent, AutosaveScheduler, DEFAULT_AUTOSAVE_INTERVAL, PullFn, SaveTrigger},
    session::{RecordingSession, SessionContext},
    settings::AutosaveSettings,
    snapshot_store::SnapshotStore,
    status_tracker::{StatusGuard, StatusTracker},
    storage::{FileStorage, HISTORY_KEY, KeyValueStorage, MemoryStorage, SNAPSHOT_KEY},
};

#[cfg(test)]
mod tests;
