use crate::AppError;

use std::{panic::Location, path::PathBuf, str::FromStr};

use error_location::ErrorLocation;
use scribe_vault_core::TranscriptionId;
use uuid::Uuid;

/// Commands sent from the console to the main application.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Begin a new recording session.
    Start,
    /// Append recognised text to the live transcript.
    Say {
        /// Text to append.
        text: String,
    },
    /// Mark the recogniser as busy (still streaming) or idle.
    SetBusy {
        /// Whether the recogniser is busy.
        busy: bool,
    },
    /// Finish the live session and promote its transcript.
    Stop,
    /// Accept the recovery offer.
    Recover,
    /// Decline the recovery offer.
    Discard,
    /// Print the history.
    List,
    /// Delete one history entry.
    Remove {
        /// Entry to delete.
        id: TranscriptionId,
    },
    /// Delete every history entry.
    Clear,
    /// Write one entry to a file in its save format.
    Export {
        /// Entry to export.
        id: TranscriptionId,
        /// Target directory; the working directory when absent.
        dir: Option<PathBuf>,
    },
    /// Promote finished text straight into history.
    Import {
        /// Finished transcript.
        text: String,
    },
    /// Turn auto-save on or off.
    SetAutosave {
        /// New auto-save flag.
        enabled: bool,
    },
    /// Print the command summary.
    Help,
    /// Request application shutdown.
    Shutdown,
}

/// One-line summary of each console command.
pub(crate) const HELP: &str = "\
commands:
  start              begin a recording
  say <text>         append text to the live transcript
  busy | idle        mark the recogniser busy or idle
  stop               finish the recording
  recover | discard  resolve the auto-saved recording from last run
  list               show history
  remove <id>        delete a history entry
  clear              delete all history
  export <id> [dir]  write an entry to <title>.<format>
  import <text>      add finished text to history
  autosave on|off    toggle auto-save
  help               show this summary
  quit               exit";

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let caller = Location::caller();
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let invalid = |reason: String| AppError::InvalidCommand {
            reason,
            location: ErrorLocation::from(caller),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "start" => AppCommand::Start,
            "say" | "import" if rest.is_empty() => {
                return Err(invalid(format!("'{}' needs some text", word)));
            }
            "say" => AppCommand::Say {
                text: rest.to_string(),
            },
            "import" => AppCommand::Import {
                text: rest.to_string(),
            },
            "busy" => AppCommand::SetBusy { busy: true },
            "idle" => AppCommand::SetBusy { busy: false },
            "stop" => AppCommand::Stop,
            "recover" => AppCommand::Recover,
            "discard" => AppCommand::Discard,
            "list" | "ls" => AppCommand::List,
            "remove" | "rm" => {
                let uuid = Uuid::parse_str(rest)
                    .map_err(|e| invalid(format!("'{}' is not an entry id: {}", rest, e)))?;
                AppCommand::Remove {
                    id: TranscriptionId::from_uuid(uuid),
                }
            }
            "clear" => AppCommand::Clear,
            "export" => {
                let (id, dir) = match rest.split_once(char::is_whitespace) {
                    Some((id, dir)) => (id, Some(PathBuf::from(dir.trim()))),
                    None => (rest, None),
                };
                let uuid = Uuid::parse_str(id)
                    .map_err(|e| invalid(format!("'{}' is not an entry id: {}", id, e)))?;
                AppCommand::Export {
                    id: TranscriptionId::from_uuid(uuid),
                    dir,
                }
            }
            "autosave" => match rest.to_ascii_lowercase().as_str() {
                "on" => AppCommand::SetAutosave { enabled: true },
                "off" => AppCommand::SetAutosave { enabled: false },
                other => return Err(invalid(format!("autosave expects on|off, got '{}'", other))),
            },
            "help" | "?" => AppCommand::Help,
            "quit" | "exit" => AppCommand::Shutdown,
            "" => return Err(invalid("empty line".to_string())),
            other => return Err(invalid(format!("unknown command '{}'", other))),
        };

        Ok(command)
    }
}
