use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// All errors produced by the BrainWave Focus crates.
#[derive(Error, Debug)]
pub enum FocusError {
    /// A state or config file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The configured endpoint is not a usable WebSocket URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// A notifier could not carry out a command.
    #[error("Notifier failed on {command}: {reason}")]
    Notify { command: String, reason: String },

    /// A notifier did not answer within the configured timeout.
    #[error("Notifier timed out on {command} after {timeout:?}")]
    NotifyTimeout { command: String, timeout: Duration },
}

/// Convenience alias used throughout the focus crates.
pub type Result<T> = std::result::Result<T, FocusError>;
