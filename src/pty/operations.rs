//! PTY Operations Abstraction
//!
//! The seam between the session engine and a real pseudoterminal. Tests
//! drive the engine through scripted implementations of these traits.

use std::collections::HashMap;

use crate::config::SpawnConfig;
use crate::error::Result;
use async_trait::async_trait;
use tokio::time::Instant;

pub use super::streams::ReadEvent;

/// How a finished process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitInfo {
    /// Exit code, when the process exited normally
    pub exit_status: Option<i32>,
    /// Signal number, when the process was killed by a signal
    pub signal_status: Option<i32>,
}

impl ExitInfo {
    pub fn exited(code: i32) -> Self {
        Self {
            exit_status: Some(code),
            signal_status: None,
        }
    }

    pub fn signaled(signal: i32) -> Self {
        Self {
            exit_status: None,
            signal_status: Some(signal),
        }
    }
}

/// One running shell attached to a terminal
///
/// Implementations must deliver output in order and report end-of-stream
/// once the process side of the terminal has closed.
#[async_trait]
pub trait ShellProcess: Send {
    /// Send raw bytes to the shell's terminal input
    ///
    /// # Errors
    /// Returns an error if the terminal can no longer be written to
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Wait for the next chunk of output or until `deadline`
    ///
    /// # Errors
    /// Returns an error if reading from the terminal failed
    async fn read_until(&mut self, deadline: Instant) -> Result<ReadEvent>;

    /// Operating system process id, if known
    fn pid(&self) -> Option<u32>;

    /// Non-blocking check for process exit
    ///
    /// # Returns
    /// `Some` with the exit details once the process has ended
    fn try_wait(&mut self) -> Result<Option<ExitInfo>>;

    /// Forcefully terminate the process
    fn kill(&mut self) -> Result<()>;
}

/// Creates shell processes from a spawn configuration
pub trait Spawner: Send + Sync {
    /// Start `config.shell_path` on a fresh terminal.
    ///
    /// `env` replaces the configured environment when given.
    fn spawn(
        &self,
        config: &SpawnConfig,
        env: Option<&HashMap<String, String>>,
    ) -> Result<Box<dyn ShellProcess>>;
}
