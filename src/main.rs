//! shellrelay - console transport
//!
//! Reads lines from stdin, relays them to a persistent shell as the local
//! user and prints the rendered reply for each line.

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use shellrelay::{Config, ConfigLoader, Relay};

/// Input answered without touching the shell
const HEALTH_COMMAND: &str = "/health";
const HEALTH_REPLY: &str = "Alive!";

/// Command line arguments
#[derive(Debug, Default)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
}

impl AppArgs {
    /// Parse command line arguments
    fn parse() -> anyhow::Result<Self> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        app_args.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        bail!("Missing config file path");
                    }
                }
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-V" => {
                    println!("{} v{}", shellrelay::NAME, shellrelay::VERSION);
                    process::exit(0);
                }
                arg => bail!("Unknown argument: {}", arg),
            }
            i += 1;
        }

        Ok(app_args)
    }
}

/// Print help information
fn print_help() {
    println!("shellrelay - relay text lines into a persistent shell");
    println!();
    println!("USAGE:");
    println!("    shellrelay [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -h, --help             Print this help message");
    println!("    -V, --version          Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    shellrelay looks for configuration files in the following order:");
    println!("    1. Path specified with --config");
    let loader = ConfigLoader::new();
    for (n, path) in loader.search_paths().iter().enumerate() {
        println!("    {}. {}", n + 2, path.display());
    }
    println!("    {}. Built-in defaults", loader.search_paths().len() + 2);
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG    Set logging level (error, warn, info, debug, trace)");
}

/// Load configuration from the given file or the search paths
fn load_configuration(args: &AppArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    let config = match &args.config_path {
        Some(path) => loader
            .load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => loader.load().context("loading configuration")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("{}", e);
        print_help();
        process::exit(1);
    });

    let config = load_configuration(&args)?;

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("Starting {} v{}", shellrelay::NAME, shellrelay::VERSION);

    let Some(&local_user) = config.relay.allowed_users.first() else {
        bail!("relay.allowed_users is empty; add the local user id to the configuration");
    };
    debug!("Acting as user {}", local_user);

    let relay = Relay::from_config(&config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        if line.trim() == HEALTH_COMMAND {
            println!("{}", HEALTH_REPLY);
            continue;
        }

        match relay.handle(local_user, local_user, &line).await {
            Some(reply) => println!("{}\n", reply),
            None => warn!("Input dropped by access guard"),
        }
    }

    relay.terminal().close().await;
    info!("shellrelay shutdown complete");
    Ok(())
}
