//! squishymcbotty
//!
//! Connects to Twitch chat with the settings in `squawk.toml` and answers
//! commands until stopped.
//!
//! # Usage
//!
//! ```bash
//! # Connect for real; the token usually comes from the environment
//! SQUAWK_BOT__OAUTH_TOKEN=oauth:xxx cargo run --package squishy-bot -- --config bots/squishy-bot/squawk.toml
//!
//! # Try commands locally: type protocol lines, see what the bot would send
//! cargo run --package squishy-bot -- --dry-run
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use squawk::prelude::*;
use squawk::runtime::config::{LogLevel, LogOutput};
use tracing::info;

/// squishymcbotty, a stateful Twitch chat bot.
#[derive(Parser, Debug)]
#[command(name = "squishy-bot", version, about)]
struct Cli {
    /// Configuration file (default: squawk.toml in the current or user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. "production"
    #[arg(short, long)]
    profile: Option<String>,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Read protocol lines from stdin and print outgoing lines instead of connecting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = SquawkRuntime::builder();
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &cli.profile {
        builder = builder.profile(profile);
    }

    let log_level = cli.log_level;
    let dry_run = cli.dry_run;
    let runtime = builder
        .configure(move |config| {
            if let Some(level) = log_level {
                config.logging.level = level;
            }
            if dry_run {
                // Keep stdout for the bot's own lines.
                config.logging.output = LogOutput::Stderr;
                if config.bot.username.is_empty() {
                    config.bot.username = "squishymcbotty".to_string();
                }
                if config.bot.channels.is_empty() {
                    config.bot.channels = vec!["squawk".to_string()];
                }
            }
        })
        .build()
        .context("failed to load configuration")?;

    if cli.dry_run {
        runtime.run_dry().await?;
    } else {
        runtime.run().await?;
    }

    info!("Bye!");
    Ok(())
}
