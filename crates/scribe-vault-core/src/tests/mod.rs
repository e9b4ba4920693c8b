mod history_store;
mod scheduler;

use crate::{
    Clock, CoreResult, KeyValueStorage, NewTranscription, RecordingStatus, SaveFormat, Snapshot,
    TranscriptionMetadata, VaultError,
};

use std::{
    panic::Location,
    sync::atomic::{AtomicI64, AtomicUsize, Ordering},
};

use error_location::ErrorLocation;

/// Clock pinned to a settable instant.
pub(crate) struct FixedClock(AtomicI64);

impl FixedClock {
    pub(crate) fn at(millis: i64) -> Self {
        Self(AtomicI64::new(millis))
    }

    pub(crate) fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Storage that rejects every write, like a full or disabled medium.
#[derive(Default)]
pub(crate) struct RejectingStorage {
    pub(crate) attempts: AtomicUsize,
}

impl KeyValueStorage for RejectingStorage {
    fn get(&self, _key: &str) -> CoreResult<Option<String>> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> CoreResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(VaultError::Storage {
            key: key.to_string(),
            reason: "quota exceeded".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    fn remove(&self, _key: &str) -> CoreResult<()> {
        Ok(())
    }
}

pub(crate) fn snapshot(timestamp: i64, duration: f64, content: &str) -> Snapshot {
    Snapshot::new(
        timestamp,
        duration,
        content,
        TranscriptionMetadata::default(),
    )
}

pub(crate) fn new_entry(title: &str, content: &str, timestamp: i64) -> NewTranscription {
    NewTranscription {
        timestamp,
        title: title.to_string(),
        duration: 5.0,
        format: SaveFormat::Txt,
        content: content.to_string(),
        status: RecordingStatus::Completed,
        metadata: TranscriptionMetadata::default(),
    }
}
