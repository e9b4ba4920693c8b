use crate::{
    FileStorage, HISTORY_KEY, HistoryStore, KeyValueStorage, MemoryStorage, RecordingStatus,
    TranscriptionId, TranscriptionMetadata, TranscriptionPatch, VaultError,
    tests::{RejectingStorage, new_entry},
};

use std::sync::{Arc, atomic::Ordering};

use tempfile::TempDir;

fn empty_history() -> HistoryStore {
    HistoryStore::load(Arc::new(MemoryStorage::new()))
}

/// WHAT: New entries are prepended
/// WHY: History is ordered newest first
#[test]
fn given_two_adds_when_listing_then_newest_first() {
    // Given: An empty history
    let history = empty_history();

    // When: Adding two entries
    let first = history.add(new_entry("first", "a", 1_000));
    let second = history.add(new_entry("second", "b", 2_000));

    // Then: The second is listed first and ids differ
    let ids: Vec<TranscriptionId> = history.list().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second, first]);
    assert_ne!(first, second);
    assert_eq!(history.len(), 2);
}

/// WHAT: Manual adds are never flagged auto-saved
/// WHY: Only the recovery path may create auto-saved entries
#[test]
#[allow(clippy::unwrap_used)]
fn given_auto_saved_flag_when_adding_manually_then_flag_forced_false() {
    // Given: An entry claiming to be auto-saved
    let history = empty_history();
    let mut entry = new_entry("manual", "text", 1_000);
    entry.metadata = TranscriptionMetadata {
        is_auto_saved: true,
        ..TranscriptionMetadata::default()
    };

    // When: Adding it through the manual path and through the recovery path
    let manual = history.add(entry.clone());
    let recovered = history.add_recovered(entry);

    // Then: Only the recovered entry keeps the flag
    assert!(!history.get(manual).unwrap().metadata.is_auto_saved);
    assert!(history.get(recovered).unwrap().metadata.is_auto_saved);
}

/// WHAT: A failed entry is not active
/// WHY: Only recording/processing entries mark in-flight work
#[test]
fn given_added_entry_when_updated_to_failed_then_find_active_is_absent() {
    // Given: An empty history with one recording entry
    let history = empty_history();
    let mut entry = new_entry("t1", "x", 1_000);
    entry.status = RecordingStatus::Recording;
    let id = history.add(entry);
    assert!(history.find_active().is_some());

    // When: Marking it failed
    let applied = history.update(id, TranscriptionPatch::status(RecordingStatus::Failed));

    // Then: Nothing is active
    assert!(applied);
    assert_eq!(history.find_active(), None);
}

/// WHAT: find_active returns the first active entry in collection order
/// WHY: Several active entries are tolerated; the newest wins
#[test]
#[allow(clippy::unwrap_used)]
fn given_two_active_entries_when_finding_active_then_newest_returned() {
    // Given: Two active entries and one completed
    let history = empty_history();
    let mut older = new_entry("older", "a", 1_000);
    older.status = RecordingStatus::Processing;
    history.add(older);
    let mut newer = new_entry("newer", "b", 2_000);
    newer.status = RecordingStatus::Recording;
    let newer_id = history.add(newer);
    history.add(new_entry("done", "c", 3_000));

    // When/Then: The newest active entry is returned
    assert_eq!(history.find_active().unwrap().id, newer_id);
}

/// WHAT: Operations on unknown ids are silent no-ops
/// WHY: Late calls after removal are common and harmless
#[test]
#[allow(clippy::unwrap_used)]
fn given_unknown_id_when_mutating_then_nothing_changes() {
    // Given: A history with one entry
    let history = empty_history();
    history.add(new_entry("kept", "a", 1_000));
    let unknown = TranscriptionId::new();

    // When: Updating, setting status and removing an unknown id
    let updated = history.update(unknown, TranscriptionPatch::status(RecordingStatus::Failed));
    let status = history.set_status(unknown, RecordingStatus::Failed).unwrap();
    let removed = history.remove(unknown);

    // Then: All report no-op and the entry is untouched
    assert!(!updated);
    assert!(!status);
    assert!(!removed);
    assert_eq!(history.len(), 1);
    assert_eq!(history.list()[0].status, RecordingStatus::Completed);
}

/// WHAT: Illegal status transitions are rejected
/// WHY: A completed recording must not silently regress
#[test]
#[allow(clippy::unwrap_used)]
fn given_completed_entry_when_setting_recording_then_invalid_transition() {
    // Given: A completed entry
    let history = empty_history();
    let id = history.add(new_entry("done", "a", 1_000));

    // When: Moving it back to recording
    let result = history.set_status(id, RecordingStatus::Recording);

    // Then: Rejected, status unchanged
    assert!(matches!(
        result,
        Err(VaultError::InvalidTransition {
            from: RecordingStatus::Completed,
            to: RecordingStatus::Recording,
            ..
        })
    ));
    assert_eq!(history.get(id).unwrap().status, RecordingStatus::Completed);
}

/// WHAT: update() can correct a status set_status would reject
/// WHY: Explicit external correction stays possible
#[test]
#[allow(clippy::unwrap_used)]
fn given_completed_entry_when_patched_to_failed_then_status_corrected() {
    // Given: A completed entry
    let history = empty_history();
    let id = history.add(new_entry("done", "a", 1_000));

    // When: Correcting through update
    history.update(
        id,
        TranscriptionPatch {
            title: Some("renamed".to_string()),
            status: Some(RecordingStatus::Failed),
            ..TranscriptionPatch::default()
        },
    );

    // Then: Both fields changed, others untouched
    let entry = history.get(id).unwrap();
    assert_eq!(entry.status, RecordingStatus::Failed);
    assert_eq!(entry.title, "renamed");
    assert_eq!(entry.content, "a");
}

/// WHAT: Remove and clear delete entries
/// WHY: Users manage their history explicitly
#[test]
fn given_entries_when_removing_and_clearing_then_collection_shrinks() {
    // Given: Three entries
    let history = empty_history();
    let a = history.add(new_entry("a", "a", 1_000));
    history.add(new_entry("b", "b", 2_000));
    history.add(new_entry("c", "c", 3_000));

    // When: Removing one
    assert!(history.remove(a));

    // Then: Two remain, and clear empties the rest
    assert_eq!(history.len(), 2);
    assert_eq!(history.get(a), None);
    history.clear();
    assert!(history.is_empty());
}

/// WHAT: Every mutation is persisted immediately
/// WHY: A crash after any operation must not lose it
#[test]
#[allow(clippy::unwrap_used)]
fn given_file_storage_when_mutating_then_reload_sees_changes() {
    // Given: A file-backed history
    let dir = TempDir::new().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::open(dir.path()).unwrap());
    let history = HistoryStore::load(Arc::clone(&storage));

    // When: Adding, updating and removing
    let kept = history.add(new_entry("kept", "a", 1_000));
    let gone = history.add(new_entry("gone", "b", 2_000));
    history.update(
        kept,
        TranscriptionPatch {
            content: Some("edited".to_string()),
            ..TranscriptionPatch::default()
        },
    );
    history.remove(gone);

    // Then: A fresh load reflects every change
    let reloaded = HistoryStore::load(storage);
    let entries = reloaded.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, kept);
    assert_eq!(entries[0].content, "edited");
}

/// WHAT: Corrupt persisted history loads as empty
/// WHY: The application must always start cleanly
#[test]
#[allow(clippy::unwrap_used)]
fn given_malformed_history_json_when_loading_then_empty() {
    // Given: Garbage under the history key
    let storage = Arc::new(MemoryStorage::new());
    storage.set(HISTORY_KEY, "[{\"id\": 42").unwrap();

    // When: Loading
    let history = HistoryStore::load(storage);

    // Then: Empty and still usable
    assert!(history.is_empty());
    history.add(new_entry("fresh", "a", 1_000));
    assert_eq!(history.len(), 1);
}

/// WHAT: Persisted JSON keeps lowercase enums and camelCase fields
/// WHY: The collection layout is an external interface
#[test]
#[allow(clippy::unwrap_used)]
fn given_entry_when_persisted_then_json_layout_matches() {
    // Given: A memory-backed history
    let storage = Arc::new(MemoryStorage::new());
    let history = HistoryStore::load(Arc::clone(&storage) as Arc<dyn KeyValueStorage>);

    // When: Adding an entry
    history.add(new_entry("t", "hello", 1_000));

    // Then: The stored array has the documented shape
    let raw: serde_json::Value =
        serde_json::from_str(&storage.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
    let entry = &raw[0];
    assert_eq!(entry["status"], "completed");
    assert_eq!(entry["format"], "txt");
    assert_eq!(entry["metadata"]["isAutoSaved"], false);
    assert!(entry["id"].is_string());
}

/// WHAT: Storage failures do not lose in-memory state
/// WHY: Silent degradation when the medium is unavailable
#[test]
fn given_rejecting_storage_when_adding_then_entry_kept_in_memory() {
    // Given: Storage that rejects writes
    let storage = Arc::new(RejectingStorage::default());
    let history = HistoryStore::load(Arc::clone(&storage) as Arc<dyn KeyValueStorage>);

    // When: Adding an entry
    let id = history.add(new_entry("t", "a", 1_000));

    // Then: The write was attempted and the entry is still listed
    assert_eq!(storage.attempts.load(Ordering::SeqCst), 1);
    assert!(history.get(id).is_some());
}

/// WHAT: Unknown metadata attributes survive a round trip
/// WHY: Metadata is an open attribute set
#[test]
#[allow(clippy::unwrap_used)]
fn given_extra_metadata_when_reloaded_then_preserved() {
    // Given: An entry with an attribute this crate does not model
    let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
    let history = HistoryStore::load(Arc::clone(&storage));
    let mut entry = new_entry("t", "a", 1_000);
    entry
        .metadata
        .extra
        .insert("sampleRate".to_string(), serde_json::json!(16000));
    let id = history.add(entry);

    // When: Reloading
    let reloaded = HistoryStore::load(storage);

    // Then: The attribute is intact
    let metadata = reloaded.get(id).unwrap().metadata;
    assert_eq!(metadata.extra.get("sampleRate"), Some(&serde_json::json!(16000)));
}
