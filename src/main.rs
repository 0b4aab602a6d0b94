use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use ssh_key_scanner::{
    config::Config,
    logging,
    output::{print_duplicates, print_summary, OutputFormat},
    prober::SshProber,
    range::expand_targets,
    scanner::ScanScheduler,
    ScanError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const DUPLICATES_FOUND: u8 = 3;
}

#[derive(Parser)]
#[command(name = "ssh-key-scanner")]
#[command(
    author,
    version,
    about = "Scan IPv4 ranges for SSH servers that share host keys"
)]
struct Cli {
    /// CIDR ranges to scan, e.g. 10.0.0.0/24 (comma-separated lists accepted)
    #[arg(value_name = "CIDR", required_unless_present = "print_default_config")]
    cidrs: Vec<String>,

    /// Number of scan attempts per second
    #[arg(short, long)]
    rate_limit: Option<u32>,

    /// Maximum number of concurrent probes
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Verbosity level (0-4)
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=4))]
    verbosity: u8,

    /// Show progress bar
    #[arg(short, long)]
    progress: bool,

    /// Output format (table, json, csv)
    #[arg(short, long)]
    output_format: Option<String>,

    /// SSH port to probe
    #[arg(long)]
    port: Option<u16>,

    /// Per-probe timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print a scan summary to stderr
    #[arg(long)]
    summary: bool,

    /// Exit with code 3 if any host key is shared by several addresses
    #[arg(long)]
    fail_on_duplicates: bool,

    /// Read settings from this file instead of the default config path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the default configuration file and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();

    if cli.print_default_config {
        println!("Config path: {}", Config::config_path().display());
        println!();
        println!("{}", Config::generate_default_config());
        return Ok(exit_codes::SUCCESS);
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let config = apply_overrides(config, &cli);

    let format =
        OutputFormat::from_str(&config.default_format).map_err(ScanError::InvalidConfig)?;
    let settings = config.scan_settings()?;

    let progress = if cli.progress || config.show_progress {
        Some(new_progress_bar()?)
    } else {
        None
    };
    logging::init(cli.verbosity, progress.clone());

    let expansion = expand_targets(&cli.cidrs);
    for rejected in &expansion.rejected {
        warn!("{}", rejected);
    }

    if let Some(ref pb) = progress {
        pb.set_length(expansion.addresses.len() as u64);
    }

    let prober = Arc::new(SshProber::new(config.port, settings.timeout()));
    let mut scheduler = ScanScheduler::new(prober, settings);
    if let Some(pb) = progress.clone() {
        scheduler = scheduler.with_progress(Arc::new(move || pb.inc(1)));
    }

    let report = scheduler.run(&expansion.addresses).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let duplicates = report.duplicates();
    if duplicates.is_empty() {
        info!("No duplicate host keys found");
    }

    print_duplicates(&duplicates, format)?;

    if cli.summary || config.show_summary {
        print_summary(&report.stats, duplicates.len());
    }

    if cli.fail_on_duplicates && !duplicates.is_empty() {
        Ok(exit_codes::DUPLICATES_FOUND)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(rate_limit) = cli.rate_limit {
        config.rate_limit = rate_limit;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(ref format) = cli.output_format {
        config.default_format = format.clone();
    }
    config
}

fn new_progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} Scanning hosts...")?
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_config() {
        let cli = Cli::parse_from([
            "ssh-key-scanner",
            "-r",
            "10",
            "-c",
            "4",
            "-o",
            "csv",
            "--port",
            "2222",
            "10.0.0.0/30,10.0.1.0/30",
            "192.168.0.0/24",
        ]);
        let config = apply_overrides(Config::default(), &cli);

        assert_eq!(config.rate_limit, 10);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.port, 2222);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.default_format, "csv");
        assert_eq!(cli.cidrs.len(), 2);
    }

    #[test]
    fn test_cli_requires_a_range() {
        assert!(Cli::try_parse_from(["ssh-key-scanner"]).is_err());
        assert!(Cli::try_parse_from(["ssh-key-scanner", "--print-default-config"]).is_ok());
    }

    #[test]
    fn test_verbosity_is_bounded() {
        assert!(Cli::try_parse_from(["ssh-key-scanner", "-v", "4", "10.0.0.0/24"]).is_ok());
        assert!(Cli::try_parse_from(["ssh-key-scanner", "-v", "5", "10.0.0.0/24"]).is_err());
    }
}
