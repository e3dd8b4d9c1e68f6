//! Pseudoterminal (PTY) Management
//!
//! This module provides pseudoterminal support for shellrelay, handling
//! process spawning, exit status decoding and async I/O streams.

pub mod operations;
pub mod process;
pub mod streams;

// Re-exports for convenience
pub use operations::{ExitInfo, ShellProcess, Spawner};
pub use process::{signal_number, PtyShell, PtySpawner};
pub use streams::{PtyStreams, ReadEvent};
