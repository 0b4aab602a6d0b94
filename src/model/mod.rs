//! Core data types for host keys, duplicate findings and scan results.
//!
//! - [`HostKey`] - A public key presented by one SSH server
//! - [`Fingerprint`] - The SHA-256 identity used to group host keys
//! - [`DuplicateHostKey`] - A fingerprint observed on more than one address
//! - [`ScanStats`] - Counters describing a completed scan
//!
//! # Example
//!
//! ```
//! use ssh_key_scanner::{DuplicateHostKey, Fingerprint};
//!
//! let dup = DuplicateHostKey::new(
//!     Fingerprint::from("SHA256:abc"),
//!     vec!["10.0.0.2".to_string(), "10.0.0.1".to_string()],
//! );
//!
//! assert_eq!(dup.hosts, vec!["10.0.0.1", "10.0.0.2"]);
//! ```

mod host_key;
mod report;

pub use host_key::*;
pub use report::*;
