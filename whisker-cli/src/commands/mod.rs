//! CLI command implementations.

pub mod config;
pub mod fetch;
pub mod history;
pub mod watch;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch as signal;
use tracing::debug;
use whisker_app::{CANCELLED_MESSAGE, FetchWorkflow, WorkflowConfig};
use whisker_core::{FetchOutcome, SessionLabel};
use whisker_fetch::RemoteCatSource;
use whisker_store::{FilePersistence, RecordStore, Settings};

use crate::{Cli, ExitCode};

/// History file in effect: `--history` wins over the settings.
pub fn history_path(cli: &Cli, settings: &Settings) -> PathBuf {
    cli.history
        .clone()
        .unwrap_or_else(|| settings.history_path())
}

/// Wires the remote source, the file-backed store, and a new session.
pub fn build_workflow(cli: &Cli, settings: &Settings) -> Result<FetchWorkflow> {
    let source = RemoteCatSource::new(settings.source_config())
        .context("Failed to create HTTP client")?;
    let path = history_path(cli, settings);
    debug!(history = %path.display(), "Using history file");

    let store = RecordStore::new(Arc::new(FilePersistence::new()), path);
    let workflow = FetchWorkflow::new(Arc::new(source), Arc::new(store))
        .with_session(SessionLabel::with_prefix(&settings.owner_prefix))
        .with_config(WorkflowConfig {
            parallel: settings.parallel_fetch,
        });

    Ok(workflow)
}

/// Exit code for a finished cycle.
pub fn exit_code(outcome: &FetchOutcome, status: &str) -> ExitCode {
    if !outcome.is_empty() {
        ExitCode::Success
    } else if status == CANCELLED_MESSAGE {
        ExitCode::Cancelled
    } else {
        ExitCode::FetchFailed
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Flips to `true` on the first Ctrl-C.
pub fn interrupt_flag() -> signal::Receiver<bool> {
    let (tx, rx) = signal::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            let _ = tx.send(true);
            // Keep the sender alive so receivers see the flag, not a close.
            tx.closed().await;
        }
    });
    rx
}

/// Completes once the flag is raised. Never completes otherwise.
pub async fn interrupted(mut flag: signal::Receiver<bool>) {
    if flag.wait_for(|raised| *raised).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Completes on Ctrl-C or after `timeout`, whichever comes first.
pub async fn cancel_signal(flag: signal::Receiver<bool>, timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => {
            tokio::select! {
                () = tokio::time::sleep(timeout) => debug!(?timeout, "Cancelling after timeout"),
                () = interrupted(flag) => {}
            }
        }
        None => interrupted(flag).await,
    }
}
