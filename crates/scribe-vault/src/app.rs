use crate::{
    AppCommand, AppResult, RecordingState, app_command::HELP, config::Config, export,
};

use std::{path::PathBuf, sync::Arc};

use chrono::{Local, TimeZone};
use scribe_vault_core::{
    AutosaveEvent, AutosaveScheduler, AutosaveSettings, Clock, HistoryStore, NewTranscription,
    Promotion, RecordingSession, RecordingStatus, RecoveryCoordinator, RecoveryOutcome,
    SaveTrigger, SessionContext, TranscriptionId, VaultError, promotion,
};
use tokio::sync::{broadcast::error::RecvError, mpsc, watch};
use tracing::{error, info, instrument, warn};

/// Main application state.
///
/// Owns the single live recording and the startup recovery offer. Commands
/// arrive from the console forwarder over `command_rx`.
pub struct App {
    pub(crate) ctx: SessionContext,
    pub(crate) history: Arc<HistoryStore>,
    pub(crate) scheduler: Arc<AutosaveScheduler>,
    pub(crate) recovery: RecoveryCoordinator,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: Config,
    pub(crate) settings_tx: watch::Sender<AutosaveSettings>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) state: RecordingState,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Scribe-Vault starting");

        self.announce_startup();

        let mut events = self.scheduler.subscribe();
        let mut events_open = true;

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    self.handle_command(cmd);
                }

                event = events.recv(), if events_open => {
                    match event {
                        Ok(event) => announce_save(&event),
                        Err(RecvError::Lagged(missed)) => {
                            warn!(missed, "Auto-save notices lagged");
                        }
                        Err(RecvError::Closed) => events_open = false,
                    }
                }

                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!(error = ?e, "Failed to listen for Ctrl-C");
                    }
                    info!("Interrupted, shutting down");
                    break;
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        // Teardown: final snapshot first, then let the live session's guard
        // decide its status.
        let _ = self.shutdown_tx.send(true);
        self.scheduler.join_teardown().await;

        if let Some(id) = self.state.live_id() {
            let recoverable = self.scheduler.has_snapshot();
            warn!(id = %id, recoverable, "Recording unfinished at shutdown");
            println!("{}", unfinished_notice(id, recoverable));
        }
        self.state = RecordingState::Idle;

        info!("Scribe-Vault shut down successfully");

        Ok(())
    }

    fn announce_startup(&self) {
        if let Some(stale) = self.recovery.stale_entry() {
            println!("A recording from the last run did not finish ({}).", stale);
        }

        if let Some(snapshot) = self.recovery.check_for_recoverable() {
            println!(
                "Found an auto-saved recording from {} ({:.0}s, {} chars). Type 'recover' or 'discard'.",
                format_timestamp(snapshot.timestamp),
                snapshot.duration,
                snapshot.content.chars().count()
            );
        }

        println!("{}", HELP);
    }

    #[instrument(skip(self))]
    pub(crate) fn handle_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::Start => self.start_recording(),
            AppCommand::Say { text } => {
                if !self.state.say(&text) {
                    println!("Not recording. Type 'start' first.");
                }
            }
            AppCommand::SetBusy { busy } => {
                if !self.state.set_busy(busy) {
                    println!("Not recording.");
                }
            }
            AppCommand::Stop => self.stop_recording(),
            AppCommand::Recover => self.recover(),
            AppCommand::Discard => {
                if self.recovery.discard() {
                    println!("Auto-saved recording discarded.");
                } else {
                    println!("Nothing to discard.");
                }
            }
            AppCommand::List => self.list(),
            AppCommand::Remove { id } => self.remove(id),
            AppCommand::Clear => {
                if self.state.live_id().is_some() {
                    println!("Stop the current recording before clearing history.");
                } else {
                    self.history.clear();
                    println!("History cleared.");
                }
            }
            AppCommand::Export { id, dir } => self.export(id, dir),
            AppCommand::Import { text } => self.import(text),
            AppCommand::SetAutosave { enabled } => self.set_autosave(enabled),
            AppCommand::Help => println!("{}", HELP),
            AppCommand::Shutdown => {}
        }
    }

    fn start_recording(&mut self) {
        if let Some(id) = self.state.live_id() {
            println!("Already recording ({}).", id);
            return;
        }
        if self.recovery.check_for_recoverable().is_some() {
            println!("Resolve the auto-saved recording first: type 'recover' or 'discard'.");
            return;
        }

        let title = format!("Recording {}", format_timestamp(self.clock.now_millis()));
        match RecordingSession::begin(&self.ctx, title, self.config.transcriber.metadata()) {
            Ok(session) => {
                println!("Recording started ({}).", session.id());
                self.state = RecordingState::recording(session);
            }
            Err(e) => {
                error!(error = ?e, "Failed to start recording");
                println!("Could not start recording: {}", e);
            }
        }
    }

    fn stop_recording(&mut self) {
        match self.state.finish() {
            None => println!("Not recording."),
            Some(Ok(Promotion::Promoted(id))) => println!("Saved transcription {}.", id),
            Some(Ok(Promotion::Duplicate(id))) => {
                println!("Same transcription already saved as {}.", id);
            }
            Some(Err(VaultError::TranscriptionBusy { .. })) => {
                println!("Still transcribing. Type 'idle' once the recogniser is done.");
            }
            Some(Err(e)) => {
                error!(error = ?e, "Failed to finish recording");
                println!("Could not finish recording: {}", e);
            }
        }
    }

    fn recover(&self) {
        match self.recovery.recover() {
            RecoveryOutcome::Recovered(id) => println!("Recovered as {}.", id),
            RecoveryOutcome::AlreadyPresent(id) => {
                println!("Already in history as {}; auto-save cleared.", id);
            }
            RecoveryOutcome::NothingToRecover => println!("Nothing to recover."),
        }
    }

    fn list(&self) {
        let entries = self.history.list();
        if entries.is_empty() {
            println!("History is empty.");
            return;
        }

        for entry in entries {
            let marker = if entry.metadata.is_auto_saved {
                " (recovered)"
            } else {
                ""
            };
            println!(
                "{}  {:<10} {:>6.1}s  .{}  {}{}\n    {}",
                entry.id,
                entry.status.as_str(),
                entry.duration,
                entry.format.extension(),
                entry.title,
                marker,
                preview(&entry.content)
            );
        }
    }

    fn remove(&self, id: TranscriptionId) {
        if self.state.live_id() == Some(id) {
            println!("That entry is the live recording. Type 'stop' first.");
        } else if self.history.remove(id) {
            println!("Removed {}.", id);
        } else {
            println!("No entry {}.", id);
        }
    }

    fn export(&self, id: TranscriptionId, dir: Option<PathBuf>) {
        let Some(entry) = self.history.get(id) else {
            println!("No entry {}.", id);
            return;
        };

        let dir = dir.unwrap_or_else(|| PathBuf::from("."));
        match export::export_entry(&entry, &dir) {
            Ok(path) => println!("Exported to {}.", path.display()),
            Err(e) => {
                error!(error = ?e, "Failed to export entry");
                println!("Could not export {}: {}", id, e);
            }
        }
    }

    fn import(&self, text: String) {
        let settings = *self.settings_tx.borrow();
        let now = self.clock.now_millis();

        let new = NewTranscription {
            timestamp: now,
            title: format!("Imported {}", format_timestamp(now)),
            duration: 0.0,
            format: settings.save_format,
            content: text,
            status: RecordingStatus::Completed,
            metadata: self.config.transcriber.metadata(),
        };

        match promotion::promote(&self.history, new) {
            Promotion::Promoted(id) => println!("Imported as {}.", id),
            Promotion::Duplicate(id) => println!("Same text already saved as {}.", id),
        }
    }

    fn set_autosave(&mut self, enabled: bool) {
        self.settings_tx.send_modify(|s| s.enabled = enabled);

        if !enabled && self.scheduler.is_running() {
            self.scheduler.stop();
            info!("Auto-save disabled mid-recording, snapshot cleared");
        }

        self.config.autosave.enabled = enabled;
        if let Err(e) = self.config.save() {
            warn!(error = ?e, "Failed to persist auto-save setting");
        }

        println!("Auto-save {}.", if enabled { "on" } else { "off" });
    }
}

fn announce_save(event: &AutosaveEvent) {
    let AutosaveEvent::Saved { timestamp, trigger } = event;
    match trigger {
        SaveTrigger::Interval => println!("Auto-saved at {}.", format_timestamp(*timestamp)),
        SaveTrigger::Teardown => println!("Final auto-save at {}.", format_timestamp(*timestamp)),
    }
}

pub(crate) fn unfinished_notice(id: TranscriptionId, recoverable: bool) -> String {
    if recoverable {
        format!("Recording {} was not finished; it will be offered for recovery.", id)
    } else {
        format!("Recording {} was not finished and was not auto-saved; it is marked failed.", id)
    }
}

fn format_timestamp(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

pub(crate) fn preview(content: &str) -> String {
    const MAX_CHARS: usize = 60;
    if content.chars().count() <= MAX_CHARS {
        return content.to_string();
    }
    let cut: String = content.chars().take(MAX_CHARS).collect();
    format!("{}...", cut)
}
