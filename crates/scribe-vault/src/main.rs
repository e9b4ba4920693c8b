//! Scribe-Vault: console front end for durable transcription auto-save and
//! recovery.

mod app;
mod app_command;
mod config;
mod console_input;
mod error;
mod export;
mod recording_state;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    console_input::ConsoleInput,
    error::{AppError, Result as AppResult},
    recording_state::RecordingState,
};

use crate::config::Config;

use std::sync::Arc;

use scribe_vault_core::{
    AutosaveScheduler, Clock, FileStorage, HistoryStore, KeyValueStorage, RecoveryCoordinator,
    SessionContext, SnapshotStore, SystemClock,
};
use tokio::sync::{mpsc, watch};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "scribe_vault=debug,scribe_vault_core=debug";

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Config validation failed: {:?}", e);
        std::process::exit(1);
    }

    let data_dir = match config.data_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Failed to resolve data directory: {:?}", e);
            std::process::exit(1);
        }
    };

    let storage: Arc<dyn KeyValueStorage> = match FileStorage::open(data_dir) {
        Ok(fs) => Arc::new(fs),
        Err(e) => {
            error!("Failed to open storage: {:?}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (settings_tx, settings_rx) = watch::channel(config.autosave.settings());
        let (command_tx, command_rx) = mpsc::channel(32);

        let history = Arc::new(HistoryStore::load(Arc::clone(&storage)));
        let scheduler = Arc::new(AutosaveScheduler::new(
            SnapshotStore::new(storage),
            config.autosave.interval(),
            shutdown_rx.clone(),
        ));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        // Before any recording starts, so the slot still holds the last run's work.
        let recovery = RecoveryCoordinator::new(
            Arc::clone(&scheduler),
            Arc::clone(&history),
            settings_rx.clone(),
        );
        let ctx = SessionContext::new(
            Arc::clone(&history),
            Arc::clone(&scheduler),
            settings_rx,
            Arc::clone(&clock),
        );

        let console = ConsoleInput::new(command_tx);

        let app = App {
            ctx,
            history,
            scheduler,
            recovery,
            clock,
            config,
            settings_tx,
            command_rx,
            shutdown_tx,
            state: RecordingState::Idle,
        };

        tokio::join!(
            async {
                if let Err(e) = console.run(shutdown_rx).await {
                    error!(error = ?e, "Console input error");
                }
            },
            async {
                if let Err(e) = app.run().await {
                    error!(error = ?e, "App error");
                }
            }
        );
    });

    // The stdin reader may still be blocked in a read.
    rt.shutdown_background();
}
