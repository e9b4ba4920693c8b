use scribe_vault_core::{CoreResult, Promotion, RecordingSession, TranscriptionId};

/// Recording state for the console application.
pub enum RecordingState {
    /// Not currently recording.
    Idle,
    /// A session is live.
    Recording {
        /// The owning session flow.
        session: RecordingSession,
        /// Transcript accumulated so far.
        transcript: String,
        /// Whether the recogniser is still streaming output.
        busy: bool,
    },
}

impl RecordingState {
    /// Start tracking `session`.
    pub fn recording(session: RecordingSession) -> Self {
        RecordingState::Recording {
            session,
            transcript: String::new(),
            busy: false,
        }
    }

    /// Identifier of the live placeholder entry, if recording.
    pub fn live_id(&self) -> Option<TranscriptionId> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording { session, .. } => Some(session.id()),
        }
    }

    /// Append `text` to the live transcript. Returns false when idle.
    pub fn say(&mut self, text: &str) -> bool {
        let RecordingState::Recording {
            session,
            transcript,
            busy,
        } = self
        else {
            return false;
        };

        if !transcript.is_empty() {
            transcript.push(' ');
        }
        transcript.push_str(text);
        session.update_transcript(transcript.clone(), *busy);
        true
    }

    /// Set the recogniser-busy flag. Returns false when idle.
    pub fn set_busy(&mut self, is_busy: bool) -> bool {
        let RecordingState::Recording {
            session,
            transcript,
            busy,
        } = self
        else {
            return false;
        };

        *busy = is_busy;
        session.update_transcript(transcript.clone(), is_busy);
        true
    }

    /// Finish the live session. On success the state returns to idle; on
    /// error the session stays live. `None` when idle.
    pub fn finish(&mut self) -> Option<CoreResult<Promotion>> {
        let RecordingState::Recording { session, .. } = self else {
            return None;
        };

        let result = session.finish();
        if result.is_ok() {
            *self = RecordingState::Idle;
        }
        Some(result)
    }
}
