//! Shell Session
//!
//! One spawned shell with its expect buffer and sentinel prompt. A session
//! is owned by exactly one [`Terminal`](super::Terminal) slot and never
//! handed out.

use chrono::{DateTime, Utc};
use std::time::Duration;

use super::expect::{deadline_after, ExpectEngine, ExpectResult, PatternSet, Signal};
use super::prompt::PromptSynchronizer;
use crate::config::SpawnConfig;
use crate::error::Result;
use crate::models::Sentinel;
use crate::pty::{ExitInfo, ShellProcess};

/// How long a process gets to go away on its own before and after a kill
const REAP_GRACE: Duration = Duration::from_millis(500);
const REAP_POLL: Duration = Duration::from_millis(25);

pub struct Session {
    process: Box<dyn ShellProcess>,
    engine: ExpectEngine,
    sentinel: Sentinel,
    started_at: DateTime<Utc>,
    synchronized: bool,
    /// Sentinel prompts still to come for lines already written
    owed_prompts: usize,
    /// The last wait stopped at a caller pattern
    awaiting_answer: bool,
}

impl Session {
    pub fn new(process: Box<dyn ShellProcess>, config: &SpawnConfig) -> Self {
        Self {
            process,
            engine: ExpectEngine::new(config.encoding, config.max_buffer_bytes),
            sentinel: Sentinel::generate(),
            started_at: Utc::now(),
            synchronized: false,
            owed_prompts: 0,
            awaiting_answer: false,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    /// Regex-escaped sentinel, the ready pattern for every wait
    pub fn ready_pattern(&self) -> String {
        self.sentinel.pattern()
    }

    /// Text received but not consumed by any match yet
    pub fn pending_output(&self) -> &str {
        self.engine.buffer()
    }

    /// Install the sentinel prompt if that has not happened yet
    pub async fn ensure_synchronized(&mut self, synchronizer: &PromptSynchronizer) -> Result<()> {
        if self.synchronized {
            return Ok(());
        }
        synchronizer
            .synchronize(self.process.as_mut(), &mut self.engine, &self.sentinel)
            .await?;
        self.synchronized = true;
        Ok(())
    }

    /// True while an earlier command has not returned to the prompt
    pub fn is_busy(&self) -> bool {
        self.owed_prompts > 0
    }

    /// Account for one line of input and tell whether it must be written.
    ///
    /// An empty line while a timed-out command is still running only means
    /// "keep waiting" and is not sent. An answer to a matched caller pattern
    /// is read by the running program and adds no prompt; any other line
    /// reaches the shell and owes one more.
    pub fn begin_turn(&mut self, input: &str) -> bool {
        let answering = std::mem::take(&mut self.awaiting_answer);
        if answering {
            return true;
        }
        if input.is_empty() && self.is_busy() {
            debug!("Still waiting on {} prompt(s), not writing", self.owed_prompts);
            return false;
        }
        self.owed_prompts += 1;
        true
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.process.write(data).await
    }

    /// Wait for the current turn to end.
    ///
    /// Prompts owed to earlier lines are absorbed and their output is
    /// prepended to this turn's, so a turn only ends at its own prompt.
    pub async fn expect(&mut self, patterns: &PatternSet, timeout: Duration) -> Result<ExpectResult> {
        let deadline = deadline_after(timeout);
        let mut earlier = String::new();

        loop {
            let mut result = self
                .engine
                .expect_until(self.process.as_mut(), patterns, deadline)
                .await?;

            match patterns.signal(result.index) {
                Signal::Ready => {
                    self.owed_prompts = self.owed_prompts.saturating_sub(1);
                    if self.owed_prompts > 0 {
                        debug!("Absorbed an earlier prompt, {} still owed", self.owed_prompts);
                        earlier.push_str(&result.before);
                        continue;
                    }
                }
                Signal::Interactive(_) => self.awaiting_answer = true,
                Signal::Eof => self.owed_prompts = 0,
                Signal::Timeout => {}
            }

            if !earlier.is_empty() {
                result.before.insert_str(0, &earlier);
            }
            return Ok(result);
        }
    }

    /// Exit details if the process has already ended
    pub fn try_wait(&mut self) -> Result<Option<ExitInfo>> {
        self.process.try_wait()
    }

    pub fn is_alive(&mut self) -> bool {
        matches!(self.process.try_wait(), Ok(None))
    }

    /// Collect the exit status of a process whose output has ended.
    ///
    /// Polls for a bounded time, kills the process if it lingers and polls
    /// once more. Returns empty details if the status never became
    /// available.
    pub async fn reap(&mut self) -> Result<ExitInfo> {
        if let Some(exit) = self.wait_for_exit(REAP_GRACE).await? {
            return Ok(exit);
        }

        warn!("Shell pid {:?} closed its terminal but kept running, killing it", self.pid());
        self.process.kill()?;
        Ok(self.wait_for_exit(REAP_GRACE).await?.unwrap_or_default())
    }

    /// Forcefully end the process, ignoring failures
    pub async fn shutdown(mut self) {
        match self.process.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(e) => debug!("Status check before shutdown failed: {}", e),
        }

        info!(
            "Terminating shell pid {:?} after {}s",
            self.pid(),
            (Utc::now() - self.started_at).num_seconds()
        );
        if let Err(e) = self.process.kill() {
            warn!("Failed to kill shell pid {:?}: {}", self.pid(), e);
            return;
        }

        match self.wait_for_exit(REAP_GRACE).await {
            Ok(Some(exit)) => debug!("Shell pid {:?} ended: {:?}", self.pid(), exit),
            Ok(None) => warn!("Shell pid {:?} did not exit after kill", self.pid()),
            Err(e) => warn!("Failed to reap shell pid {:?}: {}", self.pid(), e),
        }
    }

    async fn wait_for_exit(&mut self, grace: Duration) -> Result<Option<ExitInfo>> {
        let deadline = tokio::time::Instant::now() + grace;
        loop {
            if let Some(exit) = self.process.try_wait()? {
                return Ok(Some(exit));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(REAP_POLL).await;
        }
    }
}
