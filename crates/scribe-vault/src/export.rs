//! Writing history entries out as files in their save format.

use crate::{AppError, AppResult};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use scribe_vault_core::{SaveFormat, SavedTranscription};
use tracing::{info, instrument};

/// File name for `entry`: its title with path-hostile characters replaced,
/// plus the format's extension.
pub(crate) fn file_name(entry: &SavedTranscription) -> String {
    let stem: String = entry
        .title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let stem = if stem.is_empty() {
        entry.id.to_string()
    } else {
        stem
    };

    format!("{}.{}", stem, entry.format.extension())
}

/// Render `entry` in its save format.
///
/// `txt` is the bare transcript, `json` the whole entry, and `srt` a single
/// cue spanning the recording.
#[track_caller]
pub(crate) fn render(entry: &SavedTranscription) -> AppResult<String> {
    match entry.format {
        SaveFormat::Txt => Ok(entry.content.clone()),
        SaveFormat::Json => {
            serde_json::to_string_pretty(entry).map_err(|e| AppError::ExportError {
                reason: format!("Failed to serialize entry {}: {}", entry.id, e),
                location: ErrorLocation::from(Location::caller()),
            })
        }
        SaveFormat::Srt => Ok(format!(
            "1\n00:00:00,000 --> {}\n{}\n",
            srt_timestamp(entry.duration),
            entry.content
        )),
    }
}

/// Write `entry` into `dir` and return the path written.
#[track_caller]
#[instrument(skip(entry), fields(id = %entry.id, format = %entry.format))]
pub(crate) fn export_entry(entry: &SavedTranscription, dir: &Path) -> AppResult<PathBuf> {
    let contents = render(entry)?;
    let path = dir.join(file_name(entry));

    // Atomic write: write to temp file then rename
    let temp_path = path.with_extension(format!("{}.tmp", entry.format.extension()));

    let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ExportError {
        reason: format!("Failed to create {}: {}", temp_path.display(), e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    temp_file
        .write_all(contents.as_bytes())
        .map_err(|e| AppError::ExportError {
            reason: format!("Failed to write {}: {}", temp_path.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    temp_file.sync_all().map_err(|e| AppError::ExportError {
        reason: format!("Failed to sync {}: {}", temp_path.display(), e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    fs::rename(&temp_path, &path).map_err(|e| AppError::ExportError {
        reason: format!("Failed to rename to {}: {}", path.display(), e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!(path = ?path, "Transcription exported");

    Ok(path)
}

fn srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, rest) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (secs, millis) = (rest / 1_000, rest % 1_000);
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
