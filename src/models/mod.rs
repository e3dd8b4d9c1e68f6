//! Core data models for shellrelay
//!
//! Plain data shared by the session engine and the message formatter.

pub mod outcome;
pub mod sentinel;
pub mod shell_dialect;

// Re-exports for convenience
pub use outcome::Outcome;
pub use sentinel::Sentinel;
pub use shell_dialect::ShellDialect;
