//! Watch command - a new cat on every tick.

use anyhow::Result;
use clap::Args;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::info;
use whisker_app::FetchWorkflow;
use whisker_store::SettingsStore;

use super::{build_workflow, interrupt_flag, interrupted};
use crate::output::{FetchOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between fetches.
    #[arg(long, short, default_value = "30")]
    pub interval: u64,

    /// Stop after this many fetches.
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// Minimum interval to use.
    #[arg(long, default_value = "5")]
    pub min_interval: u64,
}

/// Runs the watch command.
///
/// Ctrl-C cancels the cycle in flight and ends the watch.
pub async fn run(args: &WatchArgs, cli: &Cli, settings: &SettingsStore) -> Result<ExitCode> {
    let settings = settings.get().await;
    let workflow = Arc::new(build_workflow(cli, &settings)?);
    let refresh = args.interval.max(args.min_interval);

    info!(interval = refresh, count = ?args.count, "Starting watch mode");

    let formatter = TextFormatter::new(!cli.no_color);
    let show_text = cli.format == OutputFormat::Text && !cli.quiet;

    if settings.seed_examples && workflow.store().is_empty().await {
        workflow.seed_examples().await;
        if show_text {
            println!("{}", formatter.format_history(&workflow.store().all().await));
            println!();
        }
    }

    let (stop_printer, printer_stopped) = oneshot::channel();
    let printer = show_text.then(|| {
        tokio::spawn(print_updates(
            workflow.clone(),
            formatter,
            printer_stopped,
            std::io::stdout(),
        ))
    });

    let flag = interrupt_flag();
    let mut ticker = interval(Duration::from_secs(refresh));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycles = 0usize;
    let mut successes = 0usize;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = interrupted(flag.clone()) => break,
        }

        let outcome = workflow.fetch_until(interrupted(flag.clone())).await;
        cycles += 1;
        if !outcome.is_empty() {
            successes += 1;
        }

        if cli.format == OutputFormat::Json {
            let output = FetchOutput::new(&outcome, &workflow.status(), workflow.session());
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }

        if *flag.borrow() || args.count.is_some_and(|count| cycles >= count) {
            break;
        }
    }

    let _ = stop_printer.send(());
    if let Some(printer) = printer {
        printer.await??;
    }

    info!(cycles, successes, "Watch finished");
    if show_text {
        println!();
        println!("{}", formatter.format_watch_summary(cycles, successes));
    }

    Ok(if *flag.borrow() {
        ExitCode::Cancelled
    } else {
        ExitCode::Success
    })
}

/// Prints every status change and every new record.
///
/// Once `stop` fires, anything not yet printed is flushed before the
/// writer is handed back.
async fn print_updates<W: Write + Send + 'static>(
    workflow: Arc<FetchWorkflow>,
    formatter: TextFormatter,
    mut stop: oneshot::Receiver<()>,
    mut out: W,
) -> std::io::Result<W> {
    let mut status = workflow.subscribe_status();
    let mut history = workflow.store().subscribe();
    let mut seen = workflow.store().len().await;

    loop {
        tokio::select! {
            biased;
            changed = history.changed() => {
                if changed.is_err() {
                    break;
                }
                seen = print_new_records(&workflow, formatter, seen, &mut out).await?;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let text = status.borrow_and_update().clone();
                print_status(formatter, &text, &mut out)?;
            }
            _ = &mut stop => break,
        }
    }

    if history.has_changed().unwrap_or(false) {
        history.mark_unchanged();
        print_new_records(&workflow, formatter, seen, &mut out).await?;
    }
    if status.has_changed().unwrap_or(false) {
        let text = status.borrow_and_update().clone();
        print_status(formatter, &text, &mut out)?;
    }

    out.flush()?;
    Ok(out)
}

async fn print_new_records<W: Write>(
    workflow: &FetchWorkflow,
    formatter: TextFormatter,
    seen: usize,
    out: &mut W,
) -> std::io::Result<usize> {
    let records = workflow.store().all().await;
    for record in records.iter().skip(seen) {
        writeln!(out, "{}", formatter.format_record(record))?;
    }
    Ok(records.len())
}

fn print_status<W: Write>(formatter: TextFormatter, text: &str, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "{}", formatter.format_status_line(chrono::Local::now(), text))
}
