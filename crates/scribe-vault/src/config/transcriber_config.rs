use crate::config::default_model;

use scribe_vault_core::TranscriptionMetadata;
use serde::{Deserialize, Serialize};

/// Labels describing the recogniser, recorded in transcription metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Recognition model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Spoken language code (None = auto-detect).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TranscriberConfig {
    /// Metadata stamped on every new transcription.
    pub fn metadata(&self) -> TranscriptionMetadata {
        TranscriptionMetadata {
            model: Some(self.model.clone()),
            language: self.language.clone(),
            ..TranscriptionMetadata::default()
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            language: None,
        }
    }
}
