//! Chat Relay Wiring
//!
//! Boundary contracts between the shell terminal and a chat transport:
//! who may talk to the shell, how a long-running call is signalled to the
//! conversation, and how an incoming line turns into reply text.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{Config, RelayConfig};
use crate::message::MessageFormatter;
use crate::terminal::{SendOptions, Terminal};

/// Decides whether a user may drive the shell
pub trait AccessGuard: Send + Sync {
    fn allowed(&self, user_id: i64) -> bool;
}

/// Fixed set of permitted users; an empty list lets nobody in
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    users: HashSet<i64>,
}

impl AllowList {
    pub fn new<I: IntoIterator<Item = i64>>(users: I) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.allowed_users.iter().copied())
    }
}

impl AccessGuard for AllowList {
    fn allowed(&self, user_id: i64) -> bool {
        self.users.contains(&user_id)
    }
}

/// Brackets a long-running call with start/stop notifications
/// (typing indicators and the like)
#[async_trait]
pub trait ActivityIndicator: Send + Sync {
    async fn begin(&self, conversation_id: i64);
    async fn end(&self, conversation_id: i64);
}

/// Indicator that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndicator;

#[async_trait]
impl ActivityIndicator for NoopIndicator {
    async fn begin(&self, _conversation_id: i64) {}
    async fn end(&self, _conversation_id: i64) {}
}

/// Routes incoming chat lines through the access guard into the terminal
/// and renders the outcome as reply text
pub struct Relay {
    terminal: Arc<Terminal>,
    guard: Arc<dyn AccessGuard>,
    indicator: Arc<dyn ActivityIndicator>,
    formatter: MessageFormatter,
}

impl Relay {
    pub fn new(
        terminal: Arc<Terminal>,
        guard: Arc<dyn AccessGuard>,
        indicator: Arc<dyn ActivityIndicator>,
        max_message_len: usize,
    ) -> Self {
        Self {
            terminal,
            guard,
            indicator,
            formatter: MessageFormatter::new(max_message_len),
        }
    }

    /// Native PTY terminal, allow list from configuration, no indicator
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(Terminal::new(config.shell.clone())),
            Arc::new(AllowList::from_config(&config.relay)),
            Arc::new(NoopIndicator),
            config.relay.max_message_len,
        )
    }

    pub fn terminal(&self) -> &Arc<Terminal> {
        &self.terminal
    }

    /// Handle one line from `user_id`.
    ///
    /// Returns `None` for users the guard rejects; the terminal never sees
    /// their input.
    pub async fn handle(&self, user_id: i64, conversation_id: i64, text: &str) -> Option<String> {
        if !self.guard.allowed(user_id) {
            warn!("Rejected input from user {}", user_id);
            return None;
        }

        self.indicator.begin(conversation_id).await;
        let outcome = self.terminal.send(text, SendOptions::default()).await;
        self.indicator.end(conversation_id).await;

        Some(self.formatter.format(&outcome))
    }
}
