mod recording_status;
mod save_format;
mod snapshot;
mod transcription;

pub use {
    recording_status::RecordingStatus,
    save_format::SaveFormat,
    snapshot::Snapshot,
    transcription::{
        NewTranscription, SavedTranscription, TranscriptionId, TranscriptionMetadata,
        TranscriptionPatch,
    },
};
