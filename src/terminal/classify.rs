//! Response Classification
//!
//! Maps the result of a wait onto exactly one [`Outcome`] variant.

use super::expect::{ExpectResult, Signal};
use super::sanitize::{sanitize, strip_echo};
use crate::error::Error;
use crate::models::Outcome;
use crate::pty::ExitInfo;

/// Build the outcome for one wait.
///
/// `exit` is only consulted for [`Signal::Ready`] and [`Signal::Eof`]; it
/// carries the process's status when the process has already ended.
pub fn classify(
    signal: Signal,
    result: &ExpectResult,
    exit: Option<ExitInfo>,
    input: &str,
    timeout_secs: u64,
) -> Outcome {
    let output = strip_echo(&sanitize(&result.before), input);

    match signal {
        Signal::Ready | Signal::Eof => {
            let exit = exit.unwrap_or_default();
            Outcome::Completed {
                output,
                exit_status: exit.exit_status,
                signal_status: exit.signal_status,
            }
        }
        Signal::Interactive(_) => Outcome::Continuing {
            output,
            matched_pattern: result.after.clone(),
        },
        Signal::Timeout => Outcome::TimedOut {
            output,
            timeout_seconds: timeout_secs,
        },
    }
}

/// Outcome for an error raised while driving the session
pub fn failure(error: &Error, partial: Option<&str>) -> Outcome {
    let partial_output = partial.map(sanitize).filter(|text| !text.is_empty());
    Outcome::Failed {
        message: error.to_string(),
        partial_output,
    }
}
