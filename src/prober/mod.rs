//! Host key retrieval.
//!
//! This module provides the [`HostKeyProber`] trait and the [`SshProber`]
//! implementation that learns a server's host key from the SSH transport
//! handshake without ever authenticating.
//!
//! # Example
//!
//! ```no_run
//! use ssh_key_scanner::prober::{HostKeyProber, ProbeOutcome, SshProber};
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let prober = SshProber::new(22, Duration::from_secs(5));
//!
//!     match prober.probe(Ipv4Addr::new(192, 168, 1, 10)).await {
//!         ProbeOutcome::Key(key) => println!("{}", key.fingerprint()),
//!         ProbeOutcome::NoKey => println!("no key presented"),
//!         ProbeOutcome::ConnectionError(e) => println!("failed: {}", e),
//!     }
//! }
//! ```

mod ssh;

pub use ssh::{classify_error_message, classify_handshake_error, SshProber};

use crate::model::HostKey;
use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::time::Duration;
use thiserror::Error;

/// Why a probe could not reach the point of seeing a host key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Transport(String),
}

/// Result of probing a single address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server presented a host key.
    Key(HostKey),
    /// The endpoint answered but no key was observed.
    NoKey,
    /// The endpoint was refused, unreachable or timed out.
    ConnectionError(ProbeError),
}

/// Retrieves the host key offered by one address.
///
/// Implementations make at most one connection attempt per call and must
/// return within their own timeout; a failed attempt is final.
#[async_trait]
pub trait HostKeyProber: Send + Sync {
    /// Returns the human-readable name of this prober.
    fn name(&self) -> &'static str;

    /// Probes `address` once.
    async fn probe(&self, address: Ipv4Addr) -> ProbeOutcome;
}
