use crate::model::ScanStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Renders scan statistics as a table.
pub fn render_summary(stats: &ScanStats, duplicate_keys: usize) -> String {
    let rows = vec![
        SummaryRow {
            metric: "Started",
            value: stats.started_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        },
        SummaryRow {
            metric: "Elapsed",
            value: format!("{:.1}s", stats.elapsed.as_secs_f64()),
        },
        SummaryRow {
            metric: "Addresses",
            value: stats.targets.to_string(),
        },
        SummaryRow {
            metric: "Host keys",
            value: stats.keys.to_string(),
        },
        SummaryRow {
            metric: "No key",
            value: stats.no_key.to_string(),
        },
        SummaryRow {
            metric: "Failed",
            value: stats.failures.to_string(),
        },
        SummaryRow {
            metric: "Fingerprints",
            value: stats.fingerprints.to_string(),
        },
        SummaryRow {
            metric: "Reused keys",
            value: duplicate_keys.to_string(),
        },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Writes the summary table to stderr so stdout stays machine-readable.
pub fn print_summary(stats: &ScanStats, duplicate_keys: usize) {
    eprintln!();
    eprintln!("{}", render_summary(stats, duplicate_keys));
}
