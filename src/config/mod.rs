//! Configuration management for shellrelay
//!
//! Explicit, immutable configuration values. The library never reads
//! process-wide environment variables on its own; anything the shell should
//! see goes through [`SpawnConfig::env`].

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::ShellDialect;

/// Main configuration structure for shellrelay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How the shell process is spawned and driven
    pub shell: SpawnConfig,

    /// Transport-facing settings
    pub relay: RelayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.shell.validate()?;
        self.relay.validate()?;
        Ok(())
    }
}

/// Text encoding used on the PTY byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// UTF-8, invalid sequences replaced with U+FFFD
    #[default]
    #[serde(alias = "utf-8")]
    Utf8,
    /// ISO-8859-1, one byte per character
    #[serde(alias = "iso-8859-1", alias = "latin-1")]
    Latin1,
}

impl TextEncoding {
    /// Encode text for writing to the shell
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }
}

/// Everything needed to spawn and drive one shell session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Shell executable path
    pub shell_path: PathBuf,

    /// Shell arguments
    pub shell_args: Vec<String>,

    /// Environment for the shell; `None` inherits the parent's environment,
    /// `Some` replaces it entirely
    pub env: Option<HashMap<String, String>>,

    /// Encoding of the PTY byte stream
    pub encoding: TextEncoding,

    /// Wait duration used when a send supplies none (seconds)
    pub default_timeout_secs: u64,

    /// Which prompt-setup commands to issue
    pub dialect: ShellDialect,

    /// Deadline for the sentinel prompt to appear after spawning (seconds)
    pub prompt_timeout_secs: u64,

    /// Keep terminal echo on
    pub echo: bool,

    /// Interactive patterns used when a send supplies none
    pub expect_patterns: Vec<String>,

    /// Upper bound on the expect buffer (bytes)
    pub max_buffer_bytes: usize,

    /// PTY rows
    pub rows: u16,

    /// PTY columns
    pub cols: u16,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            shell_path: PathBuf::from("/bin/bash"),
            shell_args: vec!["--noediting".to_string(), "-i".to_string()],
            env: None,
            encoding: TextEncoding::Utf8,
            default_timeout_secs: 30,
            dialect: ShellDialect::Posix,
            prompt_timeout_secs: 10,
            echo: false,
            expect_patterns: Vec::new(),
            max_buffer_bytes: 1024 * 1024,
            rows: 24,
            cols: 120,
        }
    }
}

impl SpawnConfig {
    /// Create a configuration for the given shell with default settings
    pub fn new(shell_path: impl Into<PathBuf>) -> Self {
        Self {
            shell_path: shell_path.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_dialect(mut self, dialect: ShellDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_default_timeout(mut self, secs: u64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    pub fn with_prompt_timeout(mut self, secs: u64) -> Self {
        self.prompt_timeout_secs = secs;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_expect_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expect_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }

    /// Default wait as a `Duration`
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Prompt synchronization deadline as a `Duration`
    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    /// Display form of the shell command line, for logs
    pub fn command_line(&self) -> String {
        let mut line = self.shell_path.display().to_string();
        for arg in &self.shell_args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.shell_path.as_os_str().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "shell.shell_path".to_string(),
                reason: "Shell path cannot be empty".to_string(),
            });
        }

        if self.default_timeout_secs == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "shell.default_timeout_secs".to_string(),
                reason: "Default timeout must be greater than 0".to_string(),
            });
        }

        if self.prompt_timeout_secs == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "shell.prompt_timeout_secs".to_string(),
                reason: "Prompt timeout must be greater than 0".to_string(),
            });
        }

        if self.max_buffer_bytes < 1024 {
            return Err(Error::ConfigValidationFailed {
                field: "shell.max_buffer_bytes".to_string(),
                reason: "Expect buffer must hold at least 1KB".to_string(),
            });
        }

        if self.rows == 0 || self.cols == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "shell.rows/cols".to_string(),
                reason: "PTY dimensions must be greater than 0".to_string(),
            });
        }

        for pattern in &self.expect_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(Error::ConfigValidationFailed {
                    field: "shell.expect_patterns".to_string(),
                    reason: format!("'{}' is not a valid regex: {}", pattern, e),
                });
            }
        }

        Ok(())
    }
}

/// Settings shared with the chat transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// User identities allowed to drive the shell
    pub allowed_users: Vec<i64>,

    /// Maximum characters of a whole rendered reply
    pub max_message_len: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            allowed_users: Vec::new(),
            max_message_len: 4000,
        }
    }
}

impl RelayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_message_len == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "relay.max_message_len".to_string(),
                reason: "Maximum message length must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
