//! Fetch command - one cat, one fact.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use whisker_app::FetchWorkflow;
use whisker_core::FetchOutcome;
use whisker_store::SettingsStore;

use super::{build_workflow, cancel_signal, exit_code, interrupt_flag};
use crate::output::{FetchOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the fetch command.
#[derive(Args, Default)]
pub struct FetchArgs {
    /// Download the picture to this file.
    #[arg(long, value_name = "PATH")]
    pub save_image: Option<PathBuf>,

    /// Cancel the fetch if it takes longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_after: Option<u64>,
}

/// Runs the fetch command.
///
/// The cycle result is always printed; a failed image download is
/// reported next to it.
pub async fn run(args: &FetchArgs, cli: &Cli, settings: &SettingsStore) -> Result<ExitCode> {
    let settings = settings.get().await;
    let workflow = build_workflow(cli, &settings)?;

    let cancel = cancel_signal(interrupt_flag(), args.timeout_after.map(Duration::from_secs));
    let outcome = workflow.fetch_until(cancel).await;
    let status = workflow.status();

    let saved = match &args.save_image {
        Some(path) => save_image(&workflow, &outcome, path).await,
        None => Ok(None),
    };
    let image_error = saved.as_ref().err().map(|e| format!("{e:#}"));
    if let Some(error) = &image_error {
        warn!(%error, "Image not saved");
    }
    let saved = saved.ok().flatten();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            if !cli.quiet || outcome.is_empty() {
                println!(
                    "{}",
                    formatter.format_outcome(&outcome, &status, workflow.session())
                );
                if let Some(path) = &saved {
                    println!("Saved to {}", path.display());
                }
            }
            if let Some(error) = &image_error {
                eprintln!("{}", formatter.format_image_error(error));
            }
        }
        OutputFormat::Json => {
            let output = FetchOutput::new(&outcome, &status, workflow.session())
                .with_saved_image(saved.as_deref())
                .with_image_error(image_error.clone());
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&output)?);
        }
    }

    match exit_code(&outcome, &status) {
        ExitCode::Success if image_error.is_some() => Ok(ExitCode::Error),
        code => Ok(code),
    }
}

/// Downloads the outcome's picture to `path`.
///
/// Returns `Ok(None)` when the outcome carries no image.
async fn save_image(
    workflow: &FetchWorkflow,
    outcome: &FetchOutcome,
    path: &Path,
) -> Result<Option<PathBuf>> {
    let Some(bytes) = workflow
        .load_image(outcome)
        .await
        .context("Failed to download image")?
    else {
        return Ok(None);
    };

    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "Image saved");
    Ok(Some(path.to_path_buf()))
}
