//! Prompt Synchronization
//!
//! Installs a fresh [`Sentinel`] as the shell prompt and waits for it to
//! show up once, so later waits can tell "command finished" apart from
//! output that only looks like a prompt.

use std::time::Duration;

use super::expect::{ExpectEngine, PatternSet, Signal};
use crate::config::{SpawnConfig, TextEncoding};
use crate::error::{Error, Result};
use crate::models::{Sentinel, ShellDialect};
use crate::pty::ShellProcess;

/// Runs the setup sequence for one freshly spawned shell
#[derive(Debug, Clone)]
pub struct PromptSynchronizer {
    dialect: ShellDialect,
    encoding: TextEncoding,
    echo: bool,
    timeout: Duration,
}

impl PromptSynchronizer {
    pub fn new(config: &SpawnConfig) -> Self {
        Self {
            dialect: config.dialect,
            encoding: config.encoding,
            echo: config.echo,
            timeout: config.prompt_timeout(),
        }
    }

    /// The setup commands as one block of input for the shell
    pub fn setup_script(&self, sentinel: &Sentinel) -> String {
        let line_ending = self.dialect.line_ending();
        let mut script = self
            .dialect
            .setup_commands(sentinel, self.echo)
            .join(line_ending);
        script.push_str(line_ending);
        script
    }

    /// Write the setup script and wait for the sentinel.
    ///
    /// Everything the shell printed before the sentinel (banners, the
    /// original prompt, the echoed setup lines) is consumed.
    ///
    /// # Errors
    /// `PromptSyncEof` if the shell exits first, `PromptSyncTimeout` if the
    /// sentinel does not appear within the configured deadline.
    pub async fn synchronize(
        &self,
        process: &mut dyn ShellProcess,
        engine: &mut ExpectEngine,
        sentinel: &Sentinel,
    ) -> Result<()> {
        debug!(
            "Installing {} prompt on pid {:?}",
            self.dialect.as_str(),
            process.pid()
        );
        let script = self.setup_script(sentinel);
        process.write(&self.encoding.encode(&script)).await?;

        let patterns = PatternSet::new(&sentinel.pattern(), &[] as &[&str])?;
        let result = engine.expect(process, &patterns, self.timeout).await?;

        match patterns.signal(result.index) {
            Signal::Ready => {
                debug!("Prompt synchronized on pid {:?}", process.pid());
                Ok(())
            }
            Signal::Eof => Err(Error::PromptSyncEof),
            Signal::Timeout | Signal::Interactive(_) => Err(Error::PromptSyncTimeout {
                timeout: self.timeout,
            }),
        }
    }
}
