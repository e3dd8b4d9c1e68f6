//! shellrelay - a persistent PTY-backed shell for chat relays
//!
//! This library keeps one interactive shell alive behind a chat
//! conversation. Each incoming line is written to the shell, and the reply
//! describes how the turn ended: the prompt came back, the program asked
//! for input, the wait timed out, or the session broke.
//!
//! ## Module Organization
//!
//! - [`terminal`] - the [`Terminal`] facade, prompt synchronization, the
//!   expect engine, output sanitizing and outcome classification
//! - [`pty`] - PTY spawning, exit status decoding, async I/O streams
//! - [`message`] - fence-quoted markdown rendering of outcomes
//! - [`relay`] - access guard, activity indicator and the chat relay
//! - [`models`] - outcome, sentinel prompt and shell dialect types
//! - [`config`] - configuration types and file loading
//! - [`mod@error`] - error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use shellrelay::{Outcome, SendOptions, SpawnConfig, Terminal};
//!
//! # async fn run() {
//! let terminal = Terminal::new(SpawnConfig::new("/bin/bash"));
//! match terminal.send("echo hello", SendOptions::new()).await {
//!     Outcome::Completed { output, .. } => println!("{}", output),
//!     other => println!("{:?}", other),
//! }
//! terminal.close().await;
//! # }
//! ```
//!
//! ## Architecture
//!
//! Every shell runs on its own pseudoterminal with two helper threads:
//!
//! - **PTY Reader Thread:** reads output and forwards it over a `tokio::mpsc` channel
//! - **PTY Writer Thread:** writes queued input to the terminal
//!
//! A `tokio::sync::Mutex` around the session makes each terminal
//! single-flight; concurrent sends queue.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod message;
pub mod models;
pub mod pty;
pub mod relay;
pub mod terminal;

// Re-exports for core functionality
pub use config::loader::ConfigLoader;
pub use config::{Config, SpawnConfig, TextEncoding};
pub use error::{Error, Result};
pub use message::MessageFormatter;
pub use models::{Outcome, Sentinel, ShellDialect};
pub use relay::{AccessGuard, ActivityIndicator, AllowList, NoopIndicator, Relay};
pub use terminal::{sanitize, SendOptions, Terminal};

// Version information
/// The current version of shellrelay from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
