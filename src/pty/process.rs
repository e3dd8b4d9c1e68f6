//! PTY Process Spawning
//!
//! Handles the creation and spawning of pseudoterminal processes
//! using the portable-pty crate for cross-platform compatibility.

use portable_pty::{native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtySize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::mpsc::channel;
use std::thread;
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::Instant;

use super::operations::{ExitInfo, ReadEvent, ShellProcess, Spawner};
use super::streams::PtyStreams;
use crate::config::SpawnConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;

/// Spawns shells on native pseudoterminals
#[derive(Debug, Clone, Copy, Default)]
pub struct PtySpawner;

impl Spawner for PtySpawner {
    fn spawn(
        &self,
        config: &SpawnConfig,
        env: Option<&HashMap<String, String>>,
    ) -> Result<Box<dyn ShellProcess>> {
        let shell = PtyShell::spawn(config, env)?;
        Ok(Box::new(shell))
    }
}

/// A shell running on a native pseudoterminal
pub struct PtyShell {
    child: Box<dyn Child + Send + Sync>,
    // Keeps the terminal open for as long as the shell is attached
    _master: Box<dyn MasterPty + Send>,
    streams: PtyStreams,
    pid: Option<u32>,
    exit: Option<ExitInfo>,
}

impl PtyShell {
    /// Spawn `config.shell_path` on a new PTY.
    ///
    /// `env` takes precedence over `config.env`. When either is set the
    /// child environment contains exactly those variables.
    pub fn spawn(config: &SpawnConfig, env: Option<&HashMap<String, String>>) -> Result<Self> {
        let command = config.command_line();
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::PtyCreationFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        let mut cmd_builder = CommandBuilder::new(&config.shell_path);
        cmd_builder.args(&config.shell_args);

        if let Some(vars) = env.or(config.env.as_ref()) {
            cmd_builder.env_clear();
            for (key, value) in vars {
                cmd_builder.env(key, value);
            }
        }

        if let Ok(dir) = std::env::current_dir() {
            cmd_builder.cwd(dir);
        }

        let child = pair
            .slave
            .spawn_command(cmd_builder)
            .map_err(|e| Error::CommandSpawnFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;
        // Only the child may hold the slave side, otherwise reads never see EOF
        drop(pair.slave);

        let pid = child.process_id();
        info!("Spawned shell '{}' with pid {:?}", command, pid);

        let streams = create_pty_streams(pair.master.as_ref())?;

        Ok(Self {
            child,
            _master: pair.master,
            streams,
            pid,
            exit: None,
        })
    }
}

#[async_trait]
impl ShellProcess for PtyShell {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.streams.write(data).await
    }

    async fn read_until(&mut self, deadline: Instant) -> Result<ReadEvent> {
        Ok(self.streams.read_until(deadline).await)
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn try_wait(&mut self) -> Result<Option<ExitInfo>> {
        if self.exit.is_some() {
            return Ok(self.exit);
        }

        let status = self
            .child
            .try_wait()
            .map_err(|e| Error::ProcessStatusFailed {
                reason: e.to_string(),
            })?;

        self.exit = status.map(|status| {
            let info = match status.signal().and_then(signal_number) {
                Some(signal) => ExitInfo::signaled(signal),
                None => ExitInfo::exited(status.exit_code() as i32),
            };
            debug!("Shell pid {:?} ended: {:?}", self.pid, info);
            info
        });
        Ok(self.exit)
    }

    fn kill(&mut self) -> Result<()> {
        if self.exit.is_some() {
            return Ok(());
        }
        self.child.kill().map_err(|e| Error::ProcessKillFailed {
            reason: e.to_string(),
        })
    }
}

impl Drop for PtyShell {
    fn drop(&mut self) {
        if matches!(self.try_wait(), Ok(None)) {
            let _ = self.kill();
        }
    }
}

/// Create PTY streams from the master side of a PTY pair
fn create_pty_streams(master: &dyn MasterPty) -> Result<PtyStreams> {
    // Bridge blocking PTY I/O to async via channels and background threads
    let mut master_reader = master
        .try_clone_reader()
        .map_err(|e| Error::PtyReaderCloneFailed {
            reason: e.to_string(),
        })?;
    let mut master_writer = master
        .take_writer()
        .map_err(|e| Error::PtyWriterTakeFailed {
            reason: e.to_string(),
        })?;

    // Channel: PTY output -> async consumer
    let (tx_async_out, rx_async_out) = unbounded_channel::<Vec<u8>>();
    // Channel: async producer (stdin) -> PTY writer thread
    let (tx_stdin, rx_stdin) = channel::<Vec<u8>>();

    // Reader thread: dropping the sender is how consumers learn about EOF
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut consecutive_errors = 0;
        const MAX_CONSECUTIVE_ERRORS: u32 = 5;

        loop {
            match master_reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY read EOF - process terminated");
                    break;
                }
                Ok(n) => {
                    consecutive_errors = 0;
                    if tx_async_out.send(buf[..n].to_vec()).is_err() {
                        debug!("PTY read: receiver dropped, stopping reader thread");
                        break;
                    }
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }

                    if is_hangup(&e) {
                        debug!("PTY read EIO - slave side closed");
                        break;
                    }

                    if e.kind() == std::io::ErrorKind::WouldBlock {
                        thread::sleep(std::time::Duration::from_millis(10));
                        continue;
                    }

                    consecutive_errors += 1;
                    warn!(
                        "PTY read error ({}): {} (attempt {}/{})",
                        e.kind(),
                        e,
                        consecutive_errors,
                        MAX_CONSECUTIVE_ERRORS
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("PTY read: too many consecutive errors, stopping reader thread");
                        break;
                    }

                    thread::sleep(std::time::Duration::from_millis(50));
                }
            }
        }
        debug!("PTY reader thread exiting");
    });

    // Writer thread: receive stdin data and write to PTY master
    thread::spawn(move || {
        while let Ok(data) = rx_stdin.recv() {
            let mut attempts = 0;
            const MAX_ATTEMPTS: u32 = 3;

            loop {
                match master_writer.write_all(&data) {
                    Ok(()) => {
                        if let Err(e) = master_writer.flush() {
                            debug!("PTY flush error: {}", e);
                        }
                        break;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            && attempts < MAX_ATTEMPTS =>
                    {
                        attempts += 1;
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(e) => {
                        // The reader side reports the hangup; stop accepting input
                        warn!("PTY write error ({}): {}", e.kind(), e);
                        return;
                    }
                }
            }
        }
        debug!("PTY writer thread exiting");
    });

    Ok(PtyStreams::from_channels(rx_async_out, tx_stdin))
}

#[cfg(unix)]
fn is_hangup(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(nix::errno::Errno::EIO as i32)
}

#[cfg(not(unix))]
fn is_hangup(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::BrokenPipe
}

/// Map a signal description reported for a dead child to its number.
///
/// Accepts signal names (`SIGKILL`), `strsignal` descriptions (`Killed`)
/// and numeric forms (`Signal 9`, `Unknown signal 40`).
#[cfg(unix)]
pub fn signal_number(description: &str) -> Option<i32> {
    use nix::sys::signal::Signal;
    use std::str::FromStr;

    let description = description.trim();

    if let Ok(signal) = Signal::from_str(description) {
        return Some(signal as i32);
    }

    let signal = match description.to_lowercase().as_str() {
        "hangup" => Signal::SIGHUP,
        "interrupt" => Signal::SIGINT,
        "quit" => Signal::SIGQUIT,
        "illegal instruction" => Signal::SIGILL,
        "aborted" | "abort trap" => Signal::SIGABRT,
        "floating point exception" => Signal::SIGFPE,
        "killed" => Signal::SIGKILL,
        "segmentation fault" => Signal::SIGSEGV,
        "broken pipe" => Signal::SIGPIPE,
        "alarm clock" => Signal::SIGALRM,
        "terminated" => Signal::SIGTERM,
        "bus error" => Signal::SIGBUS,
        "user defined signal 1" => Signal::SIGUSR1,
        "user defined signal 2" => Signal::SIGUSR2,
        _ => {
            return description
                .rsplit(' ')
                .next()
                .and_then(|word| word.parse::<i32>().ok())
        }
    };
    Some(signal as i32)
}

#[cfg(not(unix))]
pub fn signal_number(description: &str) -> Option<i32> {
    description
        .trim()
        .rsplit(' ')
        .next()
        .and_then(|word| word.parse::<i32>().ok())
}
