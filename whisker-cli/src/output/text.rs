//! Text output formatting with colors.

use chrono::{DateTime, Local, TimeZone};
use whisker_core::{CatRecord, FetchOutcome, SessionLabel};
use whisker_store::Settings;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Shown in place of secrets.
pub const REDACTED: &str = "********";

/// Text formatter with optional colors.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the result of one fetch cycle.
    ///
    /// A failed cycle shows only its status text.
    pub fn format_outcome(
        &self,
        outcome: &FetchOutcome,
        status: &str,
        session: &SessionLabel,
    ) -> String {
        if outcome.is_empty() {
            return format!("{} {}", self.red("✗"), status);
        }

        let mut lines = vec![format!("{} {}", self.green("✓"), self.bold(&outcome.fact))];
        if outcome.has_image() {
            lines.push(format!("  {}", self.cyan(&outcome.image_url)));
        }
        lines.push(format!("  {}", self.dim(session.as_str())));
        lines.join("\n")
    }

    /// Formats a failed picture download.
    pub fn format_image_error(&self, error: &str) -> String {
        format!("{} Image not saved: {}", self.red("✗"), error)
    }

    /// Formats a timestamped status update.
    pub fn format_status_line<Tz: TimeZone>(&self, at: DateTime<Tz>, status: &str) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!("{} {}", self.dim(&at.format("[%H:%M:%S]").to_string()), status)
    }

    /// Formats a single history record.
    pub fn format_record(&self, record: &CatRecord) -> String {
        let when = record
            .captured_at_time()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        let mut lines = vec![format!(
            "{}  {}  {}",
            self.dim(&when),
            self.bold(record.owner_label()),
            record.fact()
        )];
        if record.has_image() {
            lines.push(format!("    {}", self.cyan(record.image_url())));
        }
        lines.join("\n")
    }

    /// Formats a list of records, oldest first.
    pub fn format_history(&self, records: &[CatRecord]) -> String {
        if records.is_empty() {
            return self.dim("No cats yet.");
        }

        let mut lines = vec![
            format!("{} ({})", self.bold("History"), records.len()),
            "─".repeat(40),
        ];
        lines.extend(records.iter().map(|r| self.format_record(r)));
        lines.join("\n")
    }

    /// Formats settings as `key = value` rows.
    pub fn format_settings(&self, settings: &Settings) -> String {
        let history = settings.history_path();
        let rows = [
            ("image_endpoint", settings.image_endpoint.clone()),
            ("fact_endpoint", settings.fact_endpoint.clone()),
            (
                "api_key",
                settings
                    .api_key
                    .as_ref()
                    .map_or_else(|| "(not set)".to_string(), |_| REDACTED.to_string()),
            ),
            ("timeout_secs", settings.timeout_secs.to_string()),
            ("history_path", history.display().to_string()),
            ("owner_prefix", settings.owner_prefix.clone()),
            ("parallel_fetch", settings.parallel_fetch.to_string()),
            ("seed_examples", settings.seed_examples.to_string()),
            ("log_level", settings.log_level.to_string()),
        ];

        let mut lines = vec!["Whisker Configuration".to_string(), "─".repeat(40)];
        lines.extend(
            rows.iter()
                .map(|(key, value)| format!("{:<16} {}", format!("{key}:"), value)),
        );
        lines.join("\n")
    }

    /// Formats the end-of-watch line.
    pub fn format_watch_summary(&self, cycles: usize, successes: usize) -> String {
        let failed = cycles.saturating_sub(successes);
        let failed_str = if failed > 0 {
            self.red(&format!("{failed} failed"))
        } else {
            format!("{failed} failed")
        };
        format!(
            "{} cycle(s), {} new cat(s), {}",
            cycles,
            self.green(&successes.to_string()),
            failed_str
        )
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    fn paint(&self, color: &str, s: &str) -> String {
        if self.use_colors {
            format!("{color}{s}{RESET}")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        self.paint(BOLD, s)
    }

    fn dim(&self, s: &str) -> String {
        self.paint(DIM, s)
    }

    fn green(&self, s: &str) -> String {
        self.paint(GREEN, s)
    }

    fn red(&self, s: &str) -> String {
        self.paint(RED, s)
    }

    fn cyan(&self, s: &str) -> String {
        self.paint(CYAN, s)
    }
}
