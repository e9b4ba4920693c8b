use std::fmt;

use serde::{Deserialize, Serialize};

/// Export format recorded on a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveFormat {
    /// Plain text.
    #[default]
    Txt,
    /// JSON document.
    Json,
    /// SubRip subtitles.
    Srt,
}

impl SaveFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Txt => "txt",
            SaveFormat::Json => "json",
            SaveFormat::Srt => "srt",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
