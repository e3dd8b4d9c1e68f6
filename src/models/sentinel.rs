//! Sentinel Prompt
//!
//! A unique prompt string installed into the shell so that "ready for the
//! next command" can be told apart from output that merely looks like a
//! prompt.

use uuid::Uuid;

/// Randomly generated prompt text, kept as two halves.
///
/// Setup commands always write the halves as separate quoted literals, so
/// the terminal echo of the setup line never contains the full sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    head: String,
    tail: String,
}

impl Sentinel {
    /// Fixed leading half of every sentinel
    pub const HEAD: &'static str = "SHELLRELAY_";

    /// Generate a sentinel from a fresh v4 UUID
    pub fn generate() -> Self {
        Self::from_token(&Uuid::new_v4().simple().to_string())
    }

    /// Build a sentinel around a known token
    pub fn from_token(token: &str) -> Self {
        Self {
            head: Self::HEAD.to_string(),
            tail: format!("PROMPT_{}> ", token),
        }
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// The prompt exactly as the shell prints it
    pub fn text(&self) -> String {
        format!("{}{}", self.head, self.tail)
    }

    /// Regex-escaped prompt, used as the session's ready pattern
    pub fn pattern(&self) -> String {
        regex::escape(&self.text())
    }
}
