//! Diagnostic logging.
//!
//! Verbosity levels map onto `tracing` filters for this crate:
//!
//! | Level | Shows |
//! |-------|-------|
//! | 0 | warnings (rejected ranges, failed tasks) |
//! | 1 | scan start and completion |
//! | 2 | every retrieved fingerprint |
//! | 3 | connection errors |
//! | 4 | hosts that answered without presenting a key |
//!
//! `RUST_LOG` replaces the mapping entirely when set.

use indicatif::ProgressBar;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Target of "no host key" events, only enabled at the highest verbosity.
pub const NO_KEY_TARGET: &str = "ssh_key_scanner::no_key";

pub const MAX_VERBOSITY: u8 = 4;

/// Filter directives for a verbosity level. Levels above the maximum are
/// treated as the maximum.
pub fn filter_directives(verbosity: u8) -> String {
    match verbosity {
        0 => "warn".to_string(),
        1 => "warn,ssh_key_scanner=info".to_string(),
        2 => "warn,ssh_key_scanner=debug".to_string(),
        3 => format!("warn,ssh_key_scanner=trace,{}=off", NO_KEY_TARGET),
        _ => "warn,ssh_key_scanner=trace".to_string(),
    }
}

/// Installs the global subscriber, writing to stderr. When `progress` is
/// given, log lines are printed above the bar instead of through it.
pub fn init(verbosity: u8, progress: Option<ProgressBar>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(move || ProgressWriter {
            bar: progress.clone(),
        })
        .without_time()
        .with_target(false)
        .try_init();
}

struct ProgressWriter {
    bar: Option<ProgressBar>,
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.bar {
            Some(bar) if !bar.is_hidden() => {
                let msg = String::from_utf8_lossy(buf);
                bar.println(msg.trim_end());
                Ok(buf.len())
            }
            _ => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
