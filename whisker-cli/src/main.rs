// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Whisker CLI - a random cat picture and a cat fact from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Fetch one cat (default command)
//! whisker
//!
//! # Fetch and keep the picture
//! whisker fetch --save-image cat.jpg
//!
//! # JSON output
//! whisker --format json --pretty
//!
//! # A new cat every 30 seconds, five times
//! whisker watch --interval 30 --count 5
//!
//! # Everything fetched so far
//! whisker history --limit 10
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use whisker_store::{LogLevel, SettingsStore};

use commands::{config, fetch, history, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// Whisker CLI - random cats and cat facts.
#[derive(Parser)]
#[command(name = "whisker")]
#[command(about = "Random cat pictures and cat facts")]
#[command(long_about = r#"
Whisker fetches a random cat picture URL and a random cat fact, and keeps
a history of every cat it has shown you.

Sources:
  • The Cat API (images)
  • catfact.ninja (facts)

Examples:
  whisker                        # Fetch one cat
  whisker --format json          # JSON output
  whisker watch --interval 30    # Keep fetching
  whisker history                # Past cats
  whisker config set api_key KEY # Use a Cat API key
"#)]
#[command(version)]
#[command(author = "Whisker Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'fetch' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Settings file to use instead of the default one.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// History file to use for this run.
    #[arg(long, global = true, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one cat (default if no command specified).
    #[command(visible_alias = "f")]
    Fetch(fetch::FetchArgs),

    /// Keep fetching cats on an interval.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Show previously fetched cats.
    #[command(visible_alias = "h")]
    History(history::HistoryArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The fetch cycle failed.
    FetchFailed = 2,
    /// The fetch cycle was cancelled.
    Cancelled = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("whisker=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("whisker={level}")))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => SettingsStore::load(path.clone()).await?,
        None => SettingsStore::load_default().await?,
    };

    setup_logging(cli.verbose, cli.quiet, settings.get().await.log_level);

    let result = match &cli.command {
        Some(Commands::Fetch(args)) => fetch::run(args, &cli, &settings).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli, &settings).await,
        Some(Commands::History(args)) => history::run(args, &cli, &settings).await,
        Some(Commands::Config(args)) => config::run(args, &cli, &settings).await,
        None => fetch::run(&fetch::FetchArgs::default(), &cli, &settings).await,
    };

    match result {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code as i32),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            std::process::exit(ExitCode::Error as i32);
        }
    }
}
