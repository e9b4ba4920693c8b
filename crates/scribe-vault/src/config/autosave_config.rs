use crate::config::{default_autosave_enabled, default_interval_secs};

use std::time::Duration;

use scribe_vault_core::{AutosaveSettings, SaveFormat};
use serde::{Deserialize, Serialize};

/// Auto-save configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutosaveConfig {
    /// Whether in-progress recordings are snapshotted.
    #[serde(default = "default_autosave_enabled")]
    pub enabled: bool,

    /// Seconds between snapshots. Must be greater than zero.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Format assigned to promoted and recovered transcriptions.
    #[serde(default)]
    pub save_format: SaveFormat,
}

impl AutosaveConfig {
    /// Snapshot period.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// The runtime flags the core reads.
    pub fn settings(&self) -> AutosaveSettings {
        AutosaveSettings {
            enabled: self.enabled,
            save_format: self.save_format,
        }
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_autosave_enabled(),
            interval_secs: default_interval_secs(),
            save_format: SaveFormat::default(),
        }
    }
}
