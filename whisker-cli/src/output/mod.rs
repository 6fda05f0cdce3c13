//! Output formatting for CLI.

mod json;
mod text;

pub use json::{FetchOutput, HistoryOutput, JsonFormatter};
pub use text::{REDACTED, TextFormatter};
