use crate::SaveFormat;

/// Settings flags the lifecycle subsystem reads.
///
/// Shared through a `tokio::sync::watch` channel so readers always see the
/// value current at decision time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveSettings {
    /// Whether in-flight recordings are periodically snapshotted.
    pub enabled: bool,
    /// Format recorded on promoted entries.
    pub save_format: SaveFormat,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            save_format: SaveFormat::Txt,
        }
    }
}
