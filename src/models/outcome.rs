//! Send Outcome
//!
//! The tagged result of one [`Terminal::send`](crate::terminal::Terminal::send)
//! call. Exactly one variant is produced per call.

use serde::{Deserialize, Serialize};

/// Result of driving the shell through one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The command turn ended: either the sentinel prompt came back or the
    /// process reached end-of-stream.
    ///
    /// `exit_status` / `signal_status` are only set when the underlying
    /// process itself is gone.
    Completed {
        output: String,
        exit_status: Option<i32>,
        signal_status: Option<i32>,
    },

    /// A caller-supplied interactive pattern matched; the process waits for
    /// more input.
    Continuing {
        output: String,
        matched_pattern: String,
    },

    /// Nothing matched before the deadline; the process is still alive.
    TimedOut { output: String, timeout_seconds: u64 },

    /// Communication with the process broke; the session was torn down.
    Failed {
        message: String,
        partial_output: Option<String>,
    },
}

impl Outcome {
    /// Short lowercase name of the variant, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Completed { .. } => "completed",
            Outcome::Continuing { .. } => "continuing",
            Outcome::TimedOut { .. } => "timed_out",
            Outcome::Failed { .. } => "failed",
        }
    }

    /// Whether the session is gone after this outcome.
    ///
    /// A `Completed` produced by prompt reappearance leaves the shell alive,
    /// so only a `Completed` carrying a status counts as terminal here.
    pub fn ends_process(&self) -> bool {
        match self {
            Outcome::Completed {
                exit_status,
                signal_status,
                ..
            } => exit_status.is_some() || signal_status.is_some(),
            Outcome::Failed { .. } => true,
            Outcome::Continuing { .. } | Outcome::TimedOut { .. } => false,
        }
    }

    /// Captured output, if the variant carries any
    pub fn output(&self) -> Option<&str> {
        match self {
            Outcome::Completed { output, .. }
            | Outcome::Continuing { output, .. }
            | Outcome::TimedOut { output, .. } => Some(output),
            Outcome::Failed { partial_output, .. } => partial_output.as_deref(),
        }
    }
}
