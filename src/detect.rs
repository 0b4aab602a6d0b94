//! Duplicate host key detection over a frozen aggregate.

use crate::model::DuplicateHostKey;
use crate::scanner::FrozenAggregate;

/// Returns every fingerprint recorded for more than one address.
///
/// Hosts within a record are sorted ascending by their text form and records
/// are sorted by fingerprint, so the result does not depend on the order in
/// which probes completed.
pub fn find_duplicates(aggregate: &FrozenAggregate) -> Vec<DuplicateHostKey> {
    let mut duplicates: Vec<DuplicateHostKey> = aggregate
        .iter()
        .filter(|(_, hosts)| hosts.len() > 1)
        .map(|(fingerprint, hosts)| DuplicateHostKey::new(fingerprint.clone(), hosts.to_vec()))
        .collect();

    duplicates.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
    duplicates
}
