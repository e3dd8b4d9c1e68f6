//! Test Utilities and Mocks
//!
//! Scripted shells and configuration fixtures shared by the integration
//! tests.

#![allow(dead_code)]

pub mod scripted_shell;

pub use scripted_shell::{After, EventLog, Reply, Script, ScriptedSpawner, Startup};

use shellrelay::config::SpawnConfig;
use shellrelay::pty::ExitInfo;
use shellrelay::Terminal;
use std::sync::Arc;

/// Spawn configuration used with scripted shells
pub fn scripted_config() -> SpawnConfig {
    SpawnConfig::new("/bin/scripted")
        .with_default_timeout(5)
        .with_prompt_timeout(1)
}

/// Terminal backed by `spawner`
pub fn scripted_terminal(spawner: &ScriptedSpawner) -> Terminal {
    Terminal::with_spawner(scripted_config(), Arc::new(spawner.clone()))
}

/// A repertoire covering the common cases
pub fn standard_script() -> Script {
    Script::new()
        .reply("echo hello", Reply::prompt("hello"))
        .reply("sudo true", Reply::wait("[sudo] Password:"))
        .reply("hunter2", Reply::prompt("accepted"))
        .reply("exit 3", Reply::exit("logout", ExitInfo::exited(3)))
}

/// Configuration for real `/bin/sh` sessions
pub fn sh_config() -> SpawnConfig {
    SpawnConfig::new("/bin/sh")
        .with_args(["-i"])
        .with_default_timeout(10)
}
