//! The owning flow of one recording: placeholder entry, status tracking,
//! auto-save pulls and promotion on completion.

use crate::{
    AutosaveScheduler, AutosaveSettings, Clock, CoreResult, HistoryStore, NewTranscription,
    Promotion, RecordingStatus, Snapshot, StatusGuard, StatusTracker, TranscriptionId,
    TranscriptionMetadata, TranscriptionPatch, VaultError, promotion,
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard},
};

use error_location::ErrorLocation;
use tokio::{sync::watch, time::Instant};
use tracing::{debug, error, info, instrument};

/// Shared handles a [`RecordingSession`] needs. Built once at startup.
#[derive(Clone)]
pub struct SessionContext {
    history: Arc<HistoryStore>,
    scheduler: Arc<AutosaveScheduler>,
    tracker: StatusTracker,
    settings: watch::Receiver<AutosaveSettings>,
    clock: Arc<dyn Clock>,
}

impl SessionContext {
    /// Bundle the handles.
    pub fn new(
        history: Arc<HistoryStore>,
        scheduler: Arc<AutosaveScheduler>,
        settings: watch::Receiver<AutosaveSettings>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = StatusTracker::new(Arc::clone(&history), settings.clone());

        Self {
            history,
            scheduler,
            tracker,
            settings,
            clock,
        }
    }
}

/// Working state of the recording. Only read by the scheduler's pull.
#[derive(Debug)]
struct LiveState {
    started: Instant,
    ended: Option<Instant>,
    content: String,
    is_busy: bool,
    audio_bytes: Option<u64>,
}

impl LiveState {
    fn duration_secs(&self) -> f64 {
        let end = self.ended.unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.started).as_secs_f64()
    }
}

fn lock(live: &Mutex<LiveState>) -> MutexGuard<'_, LiveState> {
    live.lock().unwrap_or_else(|e| {
        error!("Live state lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}

/// One active recording.
///
/// [`RecordingSession::begin`] adds a placeholder history entry with status
/// `recording`, tracks it, and, when auto-save is enabled, hands the
/// scheduler a pull callback over the live state. [`RecordingSession::finish`]
/// promotes the result and, if this session started auto-save, stops it and
/// clears the snapshot slot. Dropping an unfinished
/// session leaves the slot in place and lets the status guard decide between
/// `processing` and `failed`.
pub struct RecordingSession {
    id: TranscriptionId,
    live: Arc<Mutex<LiveState>>,
    metadata: TranscriptionMetadata,
    /// Whether `begin` started the scheduler.
    auto_saving: bool,
    guard: Option<StatusGuard>,
    outcome: Option<Promotion>,
    ctx: SessionContext,
}

impl RecordingSession {
    /// Start a recording titled `title`.
    #[track_caller]
    #[instrument(skip(ctx, metadata))]
    pub fn begin(
        ctx: &SessionContext,
        title: String,
        metadata: TranscriptionMetadata,
    ) -> CoreResult<Self> {
        let settings = *ctx.settings.borrow();

        let id = ctx.history.add(NewTranscription {
            timestamp: ctx.clock.now_millis(),
            title,
            duration: 0.0,
            format: settings.save_format,
            content: String::new(),
            status: RecordingStatus::Recording,
            metadata: metadata.clone(),
        });

        let guard = ctx.tracker.track(id)?;

        let live = Arc::new(Mutex::new(LiveState {
            started: Instant::now(),
            ended: None,
            content: String::new(),
            is_busy: false,
            audio_bytes: None,
        }));

        if settings.enabled {
            let pull_live = Arc::clone(&live);
            let pull_clock = Arc::clone(&ctx.clock);
            let pull_metadata = metadata.clone();

            ctx.scheduler.start(move || {
                let state = lock(&pull_live);
                Some(Snapshot::new(
                    pull_clock.now_millis(),
                    state.duration_secs(),
                    state.content.clone(),
                    TranscriptionMetadata {
                        file_size: state.audio_bytes,
                        ..pull_metadata.clone()
                    },
                ))
            });
        } else {
            debug!(id = %id, "Auto-save disabled, recording is not snapshotted");
        }

        info!(id = %id, auto_save = settings.enabled, "Recording session started");

        Ok(Self {
            id,
            live,
            metadata,
            auto_saving: settings.enabled,
            guard: Some(guard),
            outcome: None,
            ctx: ctx.clone(),
        })
    }

    /// Identifier of the placeholder history entry.
    pub fn id(&self) -> TranscriptionId {
        self.id
    }

    /// Replace the transcript so far. `is_busy` is true while the
    /// recogniser is still streaming output.
    pub fn update_transcript(&self, content: impl Into<String>, is_busy: bool) {
        let mut state = lock(&self.live);
        state.content = content.into();
        state.is_busy = is_busy;
    }

    /// Record the size of the captured audio in bytes.
    pub fn set_audio_size(&self, bytes: u64) {
        lock(&self.live).audio_bytes = Some(bytes);
    }

    /// Whether the recogniser is still producing output.
    pub fn is_busy(&self) -> bool {
        lock(&self.live).is_busy
    }

    /// Recording length so far, in seconds.
    pub fn duration_secs(&self) -> f64 {
        lock(&self.live).duration_secs()
    }

    /// Promote the finished transcription and stop auto-saving.
    ///
    /// The entry is stored as not auto-saved whatever metadata `begin` was
    /// given.
    ///
    /// If history already holds the same content stamped within
    /// [`promotion::DEDUP_WINDOW_MS`], the placeholder is removed and the
    /// existing entry is reported instead. Calling `finish` again returns the
    /// first outcome.
    ///
    /// # Errors
    ///
    /// [`VaultError::TranscriptionBusy`] while the recogniser is still
    /// streaming; the session stays active.
    #[track_caller]
    #[instrument(skip(self), fields(id = %self.id))]
    pub fn finish(&mut self) -> CoreResult<Promotion> {
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }

        let (content, duration, audio_bytes) = {
            let mut state = lock(&self.live);
            if state.is_busy {
                return Err(VaultError::TranscriptionBusy {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            if state.ended.is_none() {
                state.ended = Some(Instant::now());
            }
            (state.content.clone(), state.duration_secs(), state.audio_bytes)
        };

        let now = self.ctx.clock.now_millis();

        let outcome = match promotion::find_duplicate(&self.ctx.history, &content, now, Some(self.id))
        {
            Some(existing) => {
                self.ctx.history.remove(self.id);
                // Entry is gone, so the guard's drop has nothing to decide.
                self.guard.take();
                info!(existing = %existing, "Duplicate of existing entry, placeholder removed");
                Promotion::Duplicate(existing)
            }
            None => {
                let save_format = self.ctx.settings.borrow().save_format;

                self.ctx.history.update(
                    self.id,
                    TranscriptionPatch {
                        timestamp: Some(now),
                        duration: Some(duration),
                        format: Some(save_format),
                        content: Some(content),
                        metadata: Some(TranscriptionMetadata {
                            file_size: audio_bytes,
                            is_auto_saved: false,
                            ..self.metadata.clone()
                        }),
                        ..TranscriptionPatch::default()
                    },
                );

                if let Some(guard) = self.guard.take() {
                    guard.resolve(RecordingStatus::Completed)?;
                }

                Promotion::Promoted(self.id)
            }
        };

        if self.auto_saving {
            self.ctx.scheduler.stop();
        }
        self.outcome = Some(outcome);

        info!(?outcome, duration_secs = duration, "Recording session finished");

        Ok(outcome)
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            // Freeze the duration any later snapshot reports.
            let mut state = lock(&self.live);
            if state.ended.is_none() {
                state.ended = Some(Instant::now());
            }
            debug!(id = %self.id, "Recording session dropped before finishing");
        }
    }
}
