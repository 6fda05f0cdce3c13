//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;
use whisker_store::{SettingsStore, default_config_dir};

use super::history_path;
use crate::output::{JsonFormatter, REDACTED, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Change one setting.
    Set {
        /// Setting name, e.g. `api_key` or `timeout_secs`.
        key: String,
        /// New value. An empty string clears optional settings.
        value: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, store: &SettingsStore) -> Result<ExitCode> {
    match &args.action {
        ConfigAction::Show => show_config(cli, store).await?,
        ConfigAction::Path => show_paths(cli, store).await?,
        ConfigAction::Set { key, value } => set_value(key, value, store).await?,
        ConfigAction::Reset => reset_config(store).await?,
    }
    Ok(ExitCode::Success)
}

async fn show_config(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let settings = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_settings(&settings));
        }
        OutputFormat::Json => {
            let mut shown = settings.clone();
            if shown.api_key.is_some() {
                shown.api_key = Some(REDACTED.to_string());
            }
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&shown)?);
        }
    }

    Ok(())
}

async fn show_paths(cli: &Cli, store: &SettingsStore) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = store.path();
    let history = history_path(cli, &store.get().await);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("History file:  {}", history.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
                "history_file": history.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_value(key: &str, value: &str, store: &SettingsStore) -> Result<()> {
    store.set(key, value).await?;
    store.save().await?;

    info!(key, "Setting updated");
    if key == "api_key" {
        println!("{key} updated");
    } else {
        println!("{key} = {value}");
    }

    Ok(())
}

async fn reset_config(store: &SettingsStore) -> Result<()> {
    store.reset().await;
    store.save().await?;

    info!(path = %store.path().display(), "Settings reset");
    println!("Configuration reset to defaults");

    Ok(())
}
