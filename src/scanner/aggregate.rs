use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::model::Fingerprint;

/// Shared map from fingerprint to the addresses that presented it.
///
/// Workers only ever call [`record`](Self::record); the whole
/// read-modify-write of one entry happens under a single lock. Reading is
/// only possible after [`freeze`](Self::freeze) ends the write phase.
#[derive(Debug, Default)]
pub struct FingerprintAggregator {
    entries: Mutex<HashMap<Fingerprint, Vec<String>>>,
}

impl FingerprintAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `address` to the entry for `fingerprint`, creating the entry if
    /// needed. An address already present for that fingerprint is not added
    /// twice.
    pub fn record(&self, fingerprint: Fingerprint, address: impl Into<String>) {
        let address = address.into();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let hosts = entries.entry(fingerprint).or_default();
        if !hosts.contains(&address) {
            hosts.push(address);
        }
    }

    /// Copies the current entries. Only used when the aggregator is still
    /// shared after every writer has finished.
    pub(crate) fn snapshot(&self) -> FrozenAggregate {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        FrozenAggregate {
            entries: entries.clone(),
        }
    }

    pub fn freeze(self) -> FrozenAggregate {
        FrozenAggregate {
            entries: self
                .entries
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Read-only view of the aggregate once every worker has finished.
#[derive(Debug, Clone, Default)]
pub struct FrozenAggregate {
    entries: HashMap<Fingerprint, Vec<String>>,
}

impl FrozenAggregate {
    /// Addresses recorded for `fingerprint`, in insertion order.
    pub fn hosts(&self, fingerprint: &Fingerprint) -> Option<&[String]> {
        self.entries.get(fingerprint).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &[String])> {
        self.entries.iter().map(|(fp, hosts)| (fp, hosts.as_slice()))
    }

    /// Number of distinct fingerprints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
