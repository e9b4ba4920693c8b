use crate::{CoreResult, KeyValueStorage, VaultError};

use std::{
    fs,
    io::{ErrorKind, Write},
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go to a `.json.tmp` sibling which is synced and then renamed over
/// the target, so a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    #[track_caller]
    #[instrument(skip(dir))]
    pub fn open(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            debug!(dir = ?dir, "Created storage directory");
        }

        Ok(Self { dir })
    }

    /// Directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    #[track_caller]
    fn storage_error(key: &str, action: &str, e: std::io::Error) -> VaultError {
        VaultError::Storage {
            key: key.to_string(),
            reason: format!("{}: {}", action, e),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl KeyValueStorage for FileStorage {
    #[track_caller]
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::storage_error(key, "Failed to read", e)),
        }
    }

    #[track_caller]
    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");

        let mut temp_file = fs::File::create(&temp_path)
            .map_err(|e| Self::storage_error(key, "Failed to create temp file", e))?;

        temp_file
            .write_all(value.as_bytes())
            .map_err(|e| Self::storage_error(key, "Failed to write temp file", e))?;

        temp_file
            .sync_all()
            .map_err(|e| Self::storage_error(key, "Failed to sync temp file", e))?;

        fs::rename(&temp_path, &path)
            .map_err(|e| Self::storage_error(key, "Failed to rename temp file", e))?;

        debug!(key, bytes = value.len(), "Stored value (atomic write)");

        Ok(())
    }

    #[track_caller]
    fn remove(&self, key: &str) -> CoreResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::storage_error(key, "Failed to remove", e)),
        }
    }
}
