//! Integration Tests for Real Shell Sessions
//!
//! These tests drive `/bin/sh` on a real pseudoterminal. They return early
//! when the environment cannot allocate a PTY.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use shellrelay::pty::PtyShell;
use shellrelay::{Outcome, SendOptions, SpawnConfig, Terminal};
use std::collections::HashMap;
use test_utils::sh_config;

fn pty_available() -> bool {
    let check = SpawnConfig::new("/bin/sh").with_args(["-c", "true"]);
    PtyShell::spawn(&check, None).is_ok()
}

fn completed_output(outcome: &Outcome) -> &str {
    match outcome {
        Outcome::Completed { output, .. } => output,
        other => panic!("expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_echo_completes_with_output() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());

    let outcome = terminal.send("echo hello", SendOptions::new()).await;
    assert_eq!(
        outcome,
        Outcome::Completed {
            output: "hello".to_string(),
            exit_status: None,
            signal_status: None,
        }
    );
    assert!(terminal.is_alive().await);
    assert_eq!(terminal.output().await, "hello");

    terminal.close().await;
    assert!(!terminal.is_alive().await);
}

#[tokio::test]
async fn test_shell_state_persists_between_sends() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());

    let outcome = terminal.send("cd /tmp", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "");
    terminal.send("GREETING=persisted", SendOptions::new()).await;

    let outcome = terminal.send("pwd", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "/tmp");
    let outcome = terminal.send("echo $GREETING", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "persisted");

    terminal.close().await;
}

#[tokio::test]
async fn test_multiline_output_is_normalized() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());

    let outcome = terminal
        .send("printf 'one\\ntwo\\nthree\\n'", SendOptions::new())
        .await;
    assert_eq!(completed_output(&outcome), "one\ntwo\nthree");

    terminal.close().await;
}

#[tokio::test]
async fn test_interactive_prompt_then_answer() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());

    let outcome = terminal
        .send(
            "printf 'Password: '; read secret; echo got-$secret",
            SendOptions::new().with_patterns(["Password:"]),
        )
        .await;
    assert_eq!(
        outcome,
        Outcome::Continuing {
            output: String::new(),
            matched_pattern: "Password:".to_string(),
        }
    );
    assert!(terminal.is_alive().await);

    let outcome = terminal.send("hunter2", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "got-hunter2");

    terminal.close().await;
}

#[tokio::test]
async fn test_timeout_then_resume() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());

    let outcome = terminal
        .send("sleep 2; echo done", SendOptions::new().with_timeout(1))
        .await;
    assert!(
        matches!(outcome, Outcome::TimedOut { timeout_seconds: 1, .. }),
        "got {:?}",
        outcome
    );
    assert!(terminal.is_alive().await);

    let outcome = terminal.send("", SendOptions::new().with_timeout(10)).await;
    assert_eq!(completed_output(&outcome), "done");

    // Later turns report their own output, not the previous one's
    let outcome = terminal.send("echo marker", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "marker");
    let outcome = terminal.send("echo other", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "other");

    terminal.close().await;
}

#[tokio::test]
async fn test_line_sent_while_command_still_running() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());

    let outcome = terminal
        .send("sleep 2", SendOptions::new().with_timeout(1))
        .await;
    assert!(matches!(outcome, Outcome::TimedOut { .. }), "got {:?}", outcome);

    // Queued behind the sleep; its turn ends at its own prompt
    let outcome = terminal
        .send("echo queued", SendOptions::new().with_timeout(10))
        .await;
    assert_eq!(completed_output(&outcome), "queued");

    let outcome = terminal.send("echo next", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "next");

    terminal.close().await;
}

#[tokio::test]
async fn test_exit_reports_status_and_clears_session() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());

    terminal.send("true", SendOptions::new()).await;
    let outcome = terminal.send("exit 3", SendOptions::new()).await;
    assert!(
        matches!(
            outcome,
            Outcome::Completed {
                exit_status: Some(3),
                signal_status: None,
                ..
            }
        ),
        "got {:?}",
        outcome
    );
    assert!(!terminal.is_alive().await);

    // The next send starts a fresh shell
    let outcome = terminal.send("echo again", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "again");
    terminal.close().await;
}

#[tokio::test]
async fn test_per_call_environment_replaces_inherited() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());
    let env = HashMap::from([
        ("PATH".to_string(), "/usr/bin:/bin".to_string()),
        ("RELAY_MARKER".to_string(), "from-env".to_string()),
    ]);

    let outcome = terminal
        .send("echo $RELAY_MARKER", SendOptions::new().with_env(env))
        .await;
    assert_eq!(completed_output(&outcome), "from-env");

    terminal.close().await;
}

#[tokio::test]
async fn test_output_resembling_a_prompt_is_not_mistaken_for_one() {
    if !pty_available() {
        return;
    }
    let terminal = Terminal::new(sh_config());

    let outcome = terminal.send("echo '$ '; echo '# '", SendOptions::new()).await;
    assert_eq!(completed_output(&outcome), "$ \n#");

    terminal.close().await;
}
