use crate::{CoreResult, KeyValueStorage};

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use tracing::error;

/// In-process storage. Values live as long as the instance.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| {
            error!("Memory storage lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.values().remove(key);
        Ok(())
    }
}
