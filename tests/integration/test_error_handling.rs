//! Integration Tests for Error Handling
//!
//! These tests verify that every failure surfaces as `Outcome::Failed`
//! and leaves the terminal ready to start over.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use shellrelay::{Outcome, SendOptions, SpawnConfig, Terminal};
use std::time::{Duration, Instant};
use test_utils::{scripted_terminal, standard_script, Reply, Script, ScriptedSpawner, Startup};

#[tokio::test]
async fn test_missing_shell_binary() {
    let terminal = Terminal::new(SpawnConfig::new("/nonexistent/shell/binary"));

    let outcome = terminal.send("echo hi", SendOptions::new()).await;
    match outcome {
        Outcome::Failed {
            message,
            partial_output,
        } => {
            assert!(message.contains("/nonexistent/shell/binary"), "{}", message);
            assert!(partial_output.is_none());
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(!terminal.is_alive().await);
}

#[tokio::test]
async fn test_unspawnable_shell_is_retried_on_next_send() {
    let spawner = ScriptedSpawner::new(Script::new().startup(Startup::Unspawnable));
    let terminal = scripted_terminal(&spawner);

    assert!(matches!(
        terminal.send("ls", SendOptions::new()).await,
        Outcome::Failed { .. }
    ));
    assert!(matches!(
        terminal.send("ls", SendOptions::new()).await,
        Outcome::Failed { .. }
    ));
    assert!(!terminal.is_alive().await);
}

#[tokio::test]
async fn test_prompt_never_appears() {
    let spawner = ScriptedSpawner::new(standard_script().startup(Startup::Silent));
    let terminal = scripted_terminal(&spawner);

    let started = Instant::now();
    let outcome = terminal.send("echo hello", SendOptions::new()).await;
    let elapsed = started.elapsed();

    match outcome {
        Outcome::Failed { message, .. } => {
            assert!(message.contains("did not appear"), "{}", message)
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    // The prompt deadline applies, not the caller's timeout
    assert!(elapsed < Duration::from_secs(4), "took {:?}", elapsed);
    assert!(!terminal.is_alive().await);
    assert!(spawner.events().contains(&"kill".to_string()));
}

#[tokio::test]
async fn test_shell_dies_during_setup() {
    let spawner = ScriptedSpawner::new(Script::new().startup(Startup::Dies));
    let terminal = scripted_terminal(&spawner);

    let outcome = terminal.send("echo hello", SendOptions::new()).await;
    match outcome {
        Outcome::Failed { message, .. } => assert!(message.contains("exited"), "{}", message),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(!terminal.is_alive().await);
}

#[tokio::test]
async fn test_invalid_pattern_fails_and_tears_down() {
    let spawner = ScriptedSpawner::new(standard_script());
    let terminal = scripted_terminal(&spawner);

    terminal.send("echo hello", SendOptions::new()).await;
    assert!(terminal.is_alive().await);

    let outcome = terminal
        .send("echo hello", SendOptions::new().with_patterns(["(unclosed"]))
        .await;
    match outcome {
        Outcome::Failed { message, .. } => assert!(message.contains("(unclosed"), "{}", message),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(!terminal.is_alive().await);

    // A fresh shell is spawned afterwards
    let outcome = terminal.send("echo hello", SendOptions::new()).await;
    assert_eq!(outcome.output(), Some("hello"));
    assert_eq!(spawner.spawn_count(), 2);
}

#[tokio::test]
async fn test_failure_keeps_partial_output() {
    let script = standard_script()
        .reply("noisy", Reply::wait("half of the output"))
        .reply("second", Reply::wait("more"));
    let spawner = ScriptedSpawner::new(script);
    let terminal = scripted_terminal(&spawner);

    let outcome = terminal
        .send("noisy", SendOptions::new().with_timeout(1))
        .await;
    assert!(matches!(outcome, Outcome::TimedOut { .. }));

    // Buffered output from the timed-out turn is reported with the failure
    let outcome = terminal
        .send("second", SendOptions::new().with_patterns(["[bad"]))
        .await;
    match outcome {
        Outcome::Failed { partial_output, .. } => {
            assert_eq!(partial_output.as_deref(), Some("half of the output"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let spawner = ScriptedSpawner::new(standard_script());
    let terminal = scripted_terminal(&spawner);

    terminal.close().await;
    terminal.send("echo hello", SendOptions::new()).await;
    terminal.close().await;
    terminal.close().await;

    assert!(!terminal.is_alive().await);
    let kills = spawner
        .events()
        .iter()
        .filter(|event| *event == "kill")
        .count();
    assert_eq!(kills, 1);
}
