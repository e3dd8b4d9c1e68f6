//! Scripted Shell for Testing
//!
//! An in-memory [`ShellProcess`] that behaves like a shell with a fixed
//! repertoire: it honors the `PS1=` setup line, answers known input lines
//! with canned output after a delay, and can ask for input or exit.

use async_trait::async_trait;
use shellrelay::config::SpawnConfig;
use shellrelay::error::{Error, Result};
use shellrelay::pty::{ExitInfo, ReadEvent, ShellProcess, Spawner};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// What the shell does after printing a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum After {
    /// Print the prompt again
    Prompt,
    /// Print nothing more, waiting for the next line
    Wait,
    /// Close the terminal and exit
    Exit(ExitInfo),
}

/// Canned answer to one input line
#[derive(Debug, Clone)]
pub struct Reply {
    pub output: String,
    pub delay: Duration,
    pub after: After,
}

impl Reply {
    pub fn prompt(output: &str) -> Self {
        Self {
            output: output.to_string(),
            delay: Duration::ZERO,
            after: After::Prompt,
        }
    }

    pub fn wait(output: &str) -> Self {
        Self {
            after: After::Wait,
            ..Self::prompt(output)
        }
    }

    pub fn exit(output: &str, exit: ExitInfo) -> Self {
        Self {
            after: After::Exit(exit),
            ..Self::prompt(output)
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// How a scripted shell reacts to being set up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Prints the new prompt after the `PS1=` line
    Normal,
    /// Never prints a prompt
    Silent,
    /// Exits as soon as it receives input
    Dies,
    /// Cannot be spawned at all
    Unspawnable,
}

/// Repertoire shared by every shell a [`ScriptedSpawner`] creates
#[derive(Debug, Clone)]
pub struct Script {
    replies: HashMap<String, Reply>,
    startup: Startup,
    banner: String,
}

impl Script {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            startup: Startup::Normal,
            banner: "$ ".to_string(),
        }
    }

    pub fn reply(mut self, input: &str, reply: Reply) -> Self {
        self.replies.insert(input.to_string(), reply);
        self
    }

    pub fn startup(mut self, startup: Startup) -> Self {
        self.startup = startup;
        self
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

/// Event log shared between a spawner, its shells and the test
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Spawns [`ScriptedShell`]s and records what happened to them
#[derive(Clone)]
pub struct ScriptedSpawner {
    script: Arc<Script>,
    pub log: EventLog,
    pub spawns: Arc<AtomicUsize>,
    pub last_env: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl ScriptedSpawner {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            log: Arc::new(Mutex::new(Vec::new())),
            spawns: Arc::new(AtomicUsize::new(0)),
            last_env: Arc::new(Mutex::new(None)),
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl Spawner for ScriptedSpawner {
    fn spawn(
        &self,
        config: &SpawnConfig,
        env: Option<&HashMap<String, String>>,
    ) -> Result<Box<dyn ShellProcess>> {
        if self.script.startup == Startup::Unspawnable {
            return Err(Error::CommandSpawnFailed {
                command: config.command_line(),
                reason: "No such file or directory".to_string(),
            });
        }

        self.spawns.fetch_add(1, Ordering::SeqCst);
        *self.last_env.lock().unwrap() = env.or(config.env.as_ref()).cloned();
        self.log.lock().unwrap().push("spawn".to_string());

        Ok(Box::new(ScriptedShell::new(
            self.script.clone(),
            self.log.clone(),
        )))
    }
}

/// One scripted shell process
pub struct ScriptedShell {
    script: Arc<Script>,
    log: EventLog,
    prompt: Option<String>,
    pending: VecDeque<(Instant, String)>,
    closing: Option<ExitInfo>,
    exit: Option<ExitInfo>,
}

impl ScriptedShell {
    fn new(script: Arc<Script>, log: EventLog) -> Self {
        let mut pending = VecDeque::new();
        pending.push_back((Instant::now(), script.banner.clone()));
        Self {
            script,
            log,
            prompt: None,
            pending,
            closing: None,
            exit: None,
        }
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }

    /// Time at which newly queued output becomes readable
    fn next_slot(&self, delay: Duration) -> Instant {
        let base = self
            .pending
            .back()
            .map(|(at, _)| *at)
            .unwrap_or_else(Instant::now)
            .max(Instant::now());
        base + delay
    }

    fn handle_line(&mut self, line: &str) {
        if self.closing.is_some() || self.exit.is_some() {
            return;
        }

        if self.script.startup == Startup::Dies {
            self.closing = Some(ExitInfo::exited(127));
            return;
        }

        if let Some(value) = line.strip_prefix("PS1=") {
            let prompt = value.replace('\'', "");
            if self.script.startup == Startup::Normal {
                let at = self.next_slot(Duration::ZERO);
                self.pending.push_back((at, prompt.clone()));
            }
            self.prompt = Some(prompt);
            return;
        }

        // Setup lines and unknown commands print nothing and re-prompt
        let prompt = match &self.prompt {
            Some(prompt) => prompt.clone(),
            None => self.script.banner.clone(),
        };
        let reply = self
            .script
            .replies
            .get(line)
            .cloned()
            .unwrap_or_else(|| Reply::prompt(""));

        let at = self.next_slot(reply.delay);
        if !reply.output.is_empty() {
            let output = format!("{}\r\n", reply.output.replace('\n', "\r\n"));
            self.pending.push_back((at, output));
        }
        match reply.after {
            After::Prompt => self.pending.push_back((at, prompt)),
            After::Wait => {}
            After::Exit(exit) => self.closing = Some(exit),
        }
    }
}

#[async_trait]
impl ShellProcess for ScriptedShell {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.exit.is_some() {
            return Err(Error::PtyInputSendFailed {
                reason: "process has exited".to_string(),
            });
        }

        let text = String::from_utf8_lossy(data).to_string();
        for line in text.lines() {
            self.record(format!("write:{}", line));
            self.handle_line(line);
        }
        Ok(())
    }

    async fn read_until(&mut self, deadline: Instant) -> Result<ReadEvent> {
        match self.pending.front() {
            Some((at, _)) if *at <= deadline => {
                sleep_until(*at).await;
                let (_, text) = self.pending.pop_front().unwrap();
                self.record(format!("deliver:{}", text.trim_end()));
                Ok(ReadEvent::Data(text.into_bytes()))
            }
            None if self.closing.is_some() => {
                self.exit = self.closing.take();
                self.record("eof".to_string());
                Ok(ReadEvent::Eof)
            }
            _ => {
                sleep_until(deadline).await;
                Ok(ReadEvent::Deadline)
            }
        }
    }

    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn try_wait(&mut self) -> Result<Option<ExitInfo>> {
        Ok(self.exit)
    }

    fn kill(&mut self) -> Result<()> {
        if self.exit.is_none() {
            self.record("kill".to_string());
            self.pending.clear();
            self.closing = None;
            self.exit = Some(ExitInfo::signaled(9));
        }
        Ok(())
    }
}
