use crate::{
    AppError,
    config::{Config, DEFAULT_INTERVAL_SECS, DEFAULT_MODEL},
};

use std::{fs, path::PathBuf};

use scribe_vault_core::SaveFormat;
use tempfile::TempDir;

/// WHAT: A missing config file is created with defaults
/// WHY: First launch must work without manual setup
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_file_when_loading_then_defaults_written() {
    // Given: An empty config directory
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    // When: Loading
    let config = Config::load_from(&path).unwrap();

    // Then: Defaults are returned and persisted
    assert!(config.autosave.enabled);
    assert_eq!(config.autosave.interval_secs, DEFAULT_INTERVAL_SECS);
    assert_eq!(config.autosave.save_format, SaveFormat::Txt);
    assert_eq!(config.transcriber.model, DEFAULT_MODEL);
    assert_eq!(config.storage.data_dir, None);
    assert!(path.exists());
    assert!(!path.with_extension("toml.tmp").exists());
}

/// WHAT: Missing keys fall back to defaults
/// WHY: Hand-edited files often set only what the user cares about
#[test]
#[allow(clippy::unwrap_used)]
fn given_partial_file_when_loading_then_missing_keys_defaulted() {
    // Given: A file overriding only the save format
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[autosave]\nsave_format = \"srt\"\n").unwrap();

    // When: Loading
    let config = Config::load_from(&path).unwrap();

    // Then: Only the override differs from defaults
    assert_eq!(config.autosave.save_format, SaveFormat::Srt);
    assert!(config.autosave.enabled);
    assert_eq!(config.autosave.interval_secs, DEFAULT_INTERVAL_SECS);
    assert_eq!(config.transcriber, Config::default().transcriber);
}

/// WHAT: Saved config loads back identically
/// WHY: The atomic write must produce a readable file
#[test]
#[allow(clippy::unwrap_used)]
fn given_custom_config_when_saved_and_loaded_then_identical() {
    // Given: A config with every section customised
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let mut config = Config::default();
    config.autosave.enabled = false;
    config.autosave.interval_secs = 5;
    config.autosave.save_format = SaveFormat::Json;
    config.storage.data_dir = Some(PathBuf::from("/var/lib/scribe-vault"));
    config.transcriber.language = Some("en".to_string());

    // When: Saving and loading
    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();

    // Then: Nothing changed
    assert_eq!(loaded, config);
}

/// WHAT: Malformed TOML is a config error
/// WHY: The user must be told rather than silently reset
#[test]
#[allow(clippy::unwrap_used)]
fn given_malformed_file_when_loading_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[autosave\nenabled = maybe").unwrap();

    let result = Config::load_from(&path);

    assert!(matches!(result, Err(AppError::ConfigError { .. })));
}

/// WHAT: A zero interval is rejected
/// WHY: The scheduler needs a positive period
#[test]
fn given_zero_interval_when_validating_then_config_error() {
    let mut config = Config::default();
    config.autosave.interval_secs = 0;

    assert!(matches!(config.validate(), Err(AppError::ConfigError { .. })));
    assert!(Config::default().validate().is_ok());
}

/// WHAT: A configured data dir wins over the platform default
/// WHY: Users can keep recordings on another volume
#[test]
#[allow(clippy::unwrap_used)]
fn given_configured_data_dir_when_resolving_then_used_verbatim() {
    let mut config = Config::default();
    config.storage.data_dir = Some(PathBuf::from("/tmp/vault"));

    assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/vault"));
}

/// WHAT: Config maps onto core settings and metadata
/// WHY: The core only sees the runtime flags and labels
#[test]
fn given_config_when_mapping_then_settings_and_metadata_match() {
    let mut config = Config::default();
    config.autosave.enabled = false;
    config.autosave.save_format = SaveFormat::Srt;
    config.transcriber.language = Some("de".to_string());

    let settings = config.autosave.settings();
    let metadata = config.transcriber.metadata();

    assert!(!settings.enabled);
    assert_eq!(settings.save_format, SaveFormat::Srt);
    assert_eq!(config.autosave.interval().as_secs(), DEFAULT_INTERVAL_SECS);
    assert_eq!(metadata.model.as_deref(), Some(DEFAULT_MODEL));
    assert_eq!(metadata.language.as_deref(), Some("de"));
    assert!(!metadata.is_auto_saved);
}
