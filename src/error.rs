//! Error types and Result aliases for shellrelay
//!
//! Nothing in this module ever reaches the chat user directly: the
//! [`Terminal`](crate::terminal::Terminal) boundary turns every error into an
//! [`Outcome::Failed`](crate::models::Outcome::Failed).

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for shellrelay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for shellrelay
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === PTY-related errors ===
    /// Failed to create PTY
    #[error("Failed to create PTY for command '{command}': {reason}")]
    PtyCreationFailed { command: String, reason: String },

    /// Failed to spawn command in PTY
    #[error("Failed to spawn command '{command}': {reason}")]
    CommandSpawnFailed { command: String, reason: String },

    /// Failed to clone PTY reader
    #[error("Failed to clone PTY reader: {reason}")]
    PtyReaderCloneFailed { reason: String },

    /// Failed to take PTY writer
    #[error("Failed to take PTY writer: {reason}")]
    PtyWriterTakeFailed { reason: String },

    /// Failed to send input to PTY
    #[error("Failed to send input to PTY: {reason}")]
    PtyInputSendFailed { reason: String },

    /// Failed to query the child's exit status
    #[error("Failed to query process status: {reason}")]
    ProcessStatusFailed { reason: String },

    /// Failed to kill the child
    #[error("Failed to terminate process: {reason}")]
    ProcessKillFailed { reason: String },

    // === Session protocol errors ===
    /// The sentinel prompt never showed up after the setup commands
    #[error("Shell prompt did not appear within {timeout:?}")]
    PromptSyncTimeout { timeout: Duration },

    /// The shell exited while the sentinel prompt was being installed
    #[error("Shell exited before its prompt could be installed")]
    PromptSyncEof,

    /// A caller-supplied expect pattern is not a valid regex
    #[error("Invalid expect pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The session slot was empty where a live session was required
    #[error("No active shell session")]
    NoActiveSession,

    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", .path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    // === I/O and serialization errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Regex compilation errors
    #[error("Regex compilation error: {0}")]
    Regex(#[from] regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    #[error("Error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
