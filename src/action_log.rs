//! Action logging for gh-switcher commands.
//!
//! Every CLI invocation is appended as one JSONL entry to `action.log` under
//! the config directory. Logging never fails a command; any error here is a
//! warning at most.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Environment variable that disables the action log when set to "0".
pub const ACTION_LOG_ENV: &str = "GHS_ACTION_LOG";

/// Log filename inside the config directory.
pub const ACTION_LOG_FILE: &str = "action.log";

/// A single action log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionLog {
    /// ISO 8601 timestamp when the action occurred
    pub timestamp: DateTime<Utc>,

    /// Command name (e.g., "switch", "assign --clean")
    pub command: String,

    /// Command arguments as JSON
    pub args: serde_json::Value,

    /// Whether the command succeeded
    pub success: bool,

    /// Error message if the command failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Command execution duration in milliseconds
    pub duration_ms: u64,
}

/// Append an entry to the action log.
///
/// Silently does nothing when disabled via `GHS_ACTION_LOG=0`; any write
/// failure is reported as a warning and swallowed.
pub fn log_action(
    config_dir: &Path,
    command: &str,
    args: serde_json::Value,
    success: bool,
    error: Option<String>,
    duration_ms: u64,
) {
    if std::env::var(ACTION_LOG_ENV).as_deref() == Ok("0") {
        return;
    }

    let entry = ActionLog {
        timestamp: Utc::now(),
        command: command.to_string(),
        args,
        success,
        error,
        duration_ms,
    };

    if let Err(e) = append_entry(&config_dir.join(ACTION_LOG_FILE), &entry) {
        eprintln!("Warning: failed to write action log: {}", e);
    }
}

fn append_entry(path: &Path, entry: &ActionLog) -> std::io::Result<()> {
    let line = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}
