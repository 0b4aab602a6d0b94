//! Rendering of duplicate host key findings.
//!
//! | Format | Shape |
//! |--------|-------|
//! | `table` | `Duplicate host key <fp> used by hosts:` then one `  - <host>` line per host |
//! | `json` | array of `{"fingerprint", "hosts"}` objects, two-space indented |
//! | `csv` | `Fingerprint,Hosts` header, hosts joined by `;` |

mod csv;
mod json;
mod summary;
mod table;

pub use self::csv::render_csv;
pub use json::render_json;
pub use summary::{print_summary, render_summary};
pub use table::render_table;

use crate::error::Result;
use crate::model::DuplicateHostKey;
use std::io::Write;

/// Output format for duplicate findings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable listing
    Table,
    /// JSON array for programmatic use
    Json,
    /// CSV for spreadsheets and downstream tools
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!(
                "Unknown output format: {}. Use 'table', 'json', or 'csv'",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

/// Formats `duplicates` as a complete document, trailing newline included.
pub fn render(duplicates: &[DuplicateHostKey], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(duplicates)),
        OutputFormat::Json => render_json(duplicates),
        OutputFormat::Csv => render_csv(duplicates),
    }
}

/// Writes `duplicates` to stdout.
pub fn print_duplicates(duplicates: &[DuplicateHostKey], format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(duplicates, format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
