//! Persistent Shell Terminal
//!
//! [`Terminal`] owns at most one live shell session and drives it one turn
//! at a time: write a line, wait for the sentinel prompt, a caller pattern,
//! end-of-stream or the deadline, and classify what happened.

pub mod classify;
pub mod decode;
pub mod expect;
pub mod prompt;
pub mod sanitize;
pub mod session;

// Re-exports for convenience
pub use classify::{classify, failure};
pub use decode::IncrementalDecoder;
pub use expect::{ExpectEngine, ExpectResult, PatternSet, Signal};
pub use prompt::PromptSynchronizer;
pub use sanitize::{sanitize, strip_echo};
pub use session::Session;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::SpawnConfig;
use crate::error::{Error, Result};
use crate::models::Outcome;
use crate::pty::{PtySpawner, Spawner};

/// Per-call overrides for [`Terminal::send`]
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Wait duration in seconds; the configured default when `None`
    pub timeout_secs: Option<u64>,
    /// Environment for a shell spawned during this call
    pub env: Option<HashMap<String, String>>,
    /// Interactive patterns; the configured defaults when `None`
    pub patterns: Option<Vec<String>>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }
}

/// Session slot guarded by the terminal lock
#[derive(Default)]
struct Slot {
    session: Option<Session>,
    last_before: String,
}

/// Facade over one persistent shell
///
/// Calls on the same terminal queue behind one another; separate terminals
/// share nothing.
pub struct Terminal {
    config: SpawnConfig,
    synchronizer: PromptSynchronizer,
    spawner: Arc<dyn Spawner>,
    slot: Mutex<Slot>,
}

impl Terminal {
    /// Create a terminal that spawns shells on native PTYs
    pub fn new(config: SpawnConfig) -> Self {
        Self::with_spawner(config, Arc::new(PtySpawner))
    }

    /// Create a terminal with a custom process spawner
    pub fn with_spawner(config: SpawnConfig, spawner: Arc<dyn Spawner>) -> Self {
        Self {
            synchronizer: PromptSynchronizer::new(&config),
            config,
            spawner,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Send one line to the shell and wait for the turn to end.
    ///
    /// Spawns and synchronizes a shell first if none is running. Never
    /// returns an error: failures become [`Outcome::Failed`] and tear the
    /// session down.
    pub async fn send(&self, input: &str, options: SendOptions) -> Outcome {
        let mut slot = self.slot.lock().await;
        let timeout_secs = options
            .timeout_secs
            .unwrap_or(self.config.default_timeout_secs);

        let outcome = match self.drive(&mut slot, input, &options, timeout_secs).await {
            Ok(outcome) => outcome,
            Err(err) => Self::fail(&mut slot, err).await,
        };

        info!("send finished: {}", outcome.kind());
        outcome
    }

    async fn drive(
        &self,
        slot: &mut Slot,
        input: &str,
        options: &SendOptions,
        timeout_secs: u64,
    ) -> Result<Outcome> {
        debug!("send: {:?} (timeout {}s)", input, timeout_secs);

        if slot.session.is_none() {
            let process = self.spawner.spawn(&self.config, options.env.as_ref())?;
            slot.session = Some(Session::new(process, &self.config));
        }
        let session = slot.session.as_mut().ok_or(Error::NoActiveSession)?;
        session.ensure_synchronized(&self.synchronizer).await?;

        let caller = options
            .patterns
            .as_deref()
            .unwrap_or(&self.config.expect_patterns);
        let patterns = PatternSet::new(&session.ready_pattern(), caller)?;

        if session.begin_turn(input) {
            let line = format!("{}{}", input, self.config.dialect.line_ending());
            session.write(&self.config.encoding.encode(&line)).await?;
        }

        let result = session
            .expect(&patterns, Duration::from_secs(timeout_secs))
            .await?;
        let signal = patterns.signal(result.index);

        let exit = match signal {
            Signal::Eof => Some(session.reap().await?),
            Signal::Ready => session.try_wait()?,
            Signal::Interactive(_) | Signal::Timeout => None,
        };

        let outcome = classify(signal, &result, exit, input, timeout_secs);
        slot.last_before = result.before;

        if signal == Signal::Eof || exit.is_some() {
            if let Some(session) = slot.session.take() {
                info!("Shell pid {:?} ended, clearing session", session.pid());
                session.shutdown().await;
            }
        }

        Ok(outcome)
    }

    /// Tear the session down and report `err` with whatever output arrived
    async fn fail(slot: &mut Slot, err: Error) -> Outcome {
        error!("Shell session failed: {}", err);

        let partial = match slot.session.take() {
            Some(session) => {
                let partial = session.pending_output().to_string();
                session.shutdown().await;
                Some(partial)
            }
            None => None,
        };

        if let Some(partial) = &partial {
            slot.last_before.clone_from(partial);
        }
        failure(&err, partial.as_deref())
    }

    /// True while a session exists and its process has not ended
    pub async fn is_alive(&self) -> bool {
        let mut slot = self.slot.lock().await;
        slot.session
            .as_mut()
            .map(|session| session.is_alive())
            .unwrap_or(false)
    }

    /// Terminate any live shell and clear the session; safe to repeat
    pub async fn close(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.session.take() {
            session.shutdown().await;
        }
    }

    /// Sanitized text captured before the most recent match
    pub async fn output(&self) -> String {
        sanitize(&self.slot.lock().await.last_before)
    }

    /// Process id of the live shell, if any
    pub async fn pid(&self) -> Option<u32> {
        self.slot.lock().await.session.as_ref().and_then(Session::pid)
    }
}
