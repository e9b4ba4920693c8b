//! Console command source.
//!
//! Reads lines from stdin on a blocking task, parses them into
//! [`AppCommand`]s and forwards them to the main application.

use crate::{AppCommand, AppError, AppResult, app_command::HELP};

use std::{
    io::{self, BufRead},
    panic::Location,
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Forwards console lines to the application as commands.
pub struct ConsoleInput {
    command_tx: mpsc::Sender<AppCommand>,
}

impl ConsoleInput {
    /// Create a forwarder sending into `command_tx`.
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Run the console loop until a shutdown signal is received or stdin
    /// closes. End of input requests shutdown.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let (line_tx, mut line_rx) = mpsc::channel::<String>(32);

        // Single persistent blocking task that forwards stdin lines.
        // Shutdown: when line_rx is dropped (loop breaks), the next
        // blocking_send() fails, breaking the blocking loop.
        let handle = tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Console input shutting down");
                    break;
                }
                line = line_rx.recv() => {
                    let Some(line) = line else {
                        info!("Console input closed");
                        self.forward(AppCommand::Shutdown).await?;
                        break;
                    };
                    self.handle_line(&line).await?;
                }
            }
        }

        drop(line_rx);

        // Best-effort join: the blocking task may be stuck in a read if no
        // further line arrives after shutdown.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Console forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Console forwarder task panicked"),
            Err(_) => debug!(
                "Console forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Parse one console line and forward it. Blank lines are ignored and
    /// invalid ones are reported without stopping the loop.
    #[instrument(skip(self))]
    pub(crate) async fn handle_line(&self, line: &str) -> AppResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }

        match line.parse::<AppCommand>() {
            Ok(command) => self.forward(command).await,
            Err(e) => {
                warn!(error = %e, "Ignoring console input");
                println!("{}\n{}", invalid_reason(&e), HELP);
                Ok(())
            }
        }
    }

    async fn forward(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to forward console command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

fn invalid_reason(error: &AppError) -> String {
    match error {
        AppError::InvalidCommand { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}
