//! History command - past cats.

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use whisker_core::SessionLabel;
use whisker_store::{FilePersistence, Persistence, RecordStore, SettingsStore};

use super::history_path;
use crate::output::{HistoryOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the history command.
#[derive(Args, Default)]
pub struct HistoryArgs {
    /// Show only the most recent N records.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Append the example records after the stored ones.
    #[arg(long)]
    pub seed: bool,
}

/// Runs the history command.
pub async fn run(args: &HistoryArgs, cli: &Cli, settings: &SettingsStore) -> Result<ExitCode> {
    let settings = settings.get().await;
    let path = history_path(cli, &settings);
    let persistence: Arc<dyn Persistence> = Arc::new(FilePersistence::new());

    let mut records = RecordStore::load_persisted(persistence.as_ref(), &path).await?;

    if args.seed {
        let examples = RecordStore::new(persistence, path.clone());
        examples
            .seed_examples(&SessionLabel::with_prefix(&settings.owner_prefix))
            .await;
        records.extend(examples.all().await);
    }

    if let Some(limit) = args.limit {
        let skip = records.len().saturating_sub(limit);
        records.drain(..skip);
    }

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_history(&records));
        }
        OutputFormat::Json => {
            let output = HistoryOutput::new(&path, records);
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(ExitCode::Success)
}
