//! Durable key-value storage backing the snapshot slot and history collection.

mod file_storage;
mod memory_storage;

pub use {file_storage::FileStorage, memory_storage::MemoryStorage};

use crate::CoreResult;

/// Key of the single auto-save snapshot slot.
pub const SNAPSHOT_KEY: &str = "autosave";

/// Key of the history collection.
pub const HISTORY_KEY: &str = "transcriptions";

/// String-valued key-value medium that survives process restart.
///
/// `set` must replace the value as a whole: a subsequent `get` observes either
/// the previous value or the new one, never a mix.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Remove the value stored under `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> CoreResult<()>;
}
