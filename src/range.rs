//! CIDR expansion into concrete scan targets.
//!
//! A range expands to every address in the block, minus the network and
//! broadcast addresses when the block holds more than two addresses. `/31`
//! and `/32` blocks are returned whole.
//!
//! # Example
//!
//! ```
//! use ssh_key_scanner::range::expand_cidr;
//! use std::net::Ipv4Addr;
//!
//! let hosts = expand_cidr("10.0.0.0/30").unwrap();
//! assert_eq!(hosts, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]);
//! ```

use ipnetwork::Ipv4Network;
use std::net::Ipv4Addr;

use crate::error::{Result, ScanError};

/// Addresses produced from a set of CIDR arguments, plus the pieces that
/// could not be parsed.
#[derive(Debug, Default)]
pub struct Expansion {
    pub addresses: Vec<Ipv4Addr>,
    pub rejected: Vec<ScanError>,
}

/// Expands one CIDR string into its usable host addresses, in ascending order.
///
/// # Errors
///
/// Returns [`ScanError::InvalidRange`] if the string is not an IPv4 address
/// followed by `/prefix`.
pub fn expand_cidr(cidr: &str) -> Result<Vec<Ipv4Addr>> {
    let cidr = cidr.trim();
    if !cidr.contains('/') {
        return Err(ScanError::invalid_range(cidr, "missing prefix length"));
    }

    let network: Ipv4Network = cidr
        .parse()
        .map_err(|e| ScanError::invalid_range(cidr, e))?;

    let mut addresses = Vec::new();
    let mut current = network.network().octets();
    while network.contains(Ipv4Addr::from(current)) {
        addresses.push(Ipv4Addr::from(current));
        if !increment(&mut current) {
            break;
        }
    }

    if addresses.len() > 2 {
        addresses.pop();
        addresses.remove(0);
    }
    Ok(addresses)
}

/// Expands every comma-separated CIDR in `args`, concatenating the results in
/// input order. Unparseable pieces are collected in [`Expansion::rejected`]
/// and skipped.
pub fn expand_targets<S: AsRef<str>>(args: &[S]) -> Expansion {
    let mut expansion = Expansion::default();

    for piece in args.iter().flat_map(|arg| arg.as_ref().split(',')) {
        match expand_cidr(piece) {
            Ok(addresses) => expansion.addresses.extend(addresses),
            Err(e) => expansion.rejected.push(e),
        }
    }

    expansion
}

/// Big-endian increment with carry. Returns false once the address wraps
/// past 255.255.255.255.
fn increment(octets: &mut [u8; 4]) -> bool {
    for byte in octets.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            return true;
        }
    }
    false
}
