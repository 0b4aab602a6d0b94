//! Error types shared across the scanner.
//!
//! Per-host probe failures are not errors at this level: they are carried in
//! [`ProbeOutcome`](crate::prober::ProbeOutcome) and never abort a scan. The
//! variants here are the conditions a caller has to act on.

use thiserror::Error;

/// Errors surfaced by range expansion, scan configuration and rendering.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A CIDR string could not be parsed as an IPv4 network and prefix.
    #[error("invalid CIDR range '{cidr}': {reason}")]
    InvalidRange { cidr: String, reason: String },

    /// Scheduler parameters or output settings are unusable.
    #[error("invalid scan configuration: {0}")]
    InvalidConfig(String),

    /// A report could not be serialized.
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),

    /// A CSV report could not be written.
    #[error("failed to render CSV report: {0}")]
    Csv(#[from] csv::Error),
}

impl ScanError {
    pub(crate) fn invalid_range(cidr: &str, reason: impl ToString) -> Self {
        ScanError::InvalidRange {
            cidr: cidr.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
