pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod prober;
pub mod range;
pub mod scanner;

pub use config::Config;
pub use detect::find_duplicates;
pub use error::ScanError;
pub use model::{DuplicateHostKey, Fingerprint, HostKey, ScanStats};
pub use prober::{HostKeyProber, ProbeOutcome, SshProber};
pub use scanner::{ScanReport, ScanScheduler, ScanSettings};
