use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Fingerprint;

/// A host key fingerprint that was presented by more than one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateHostKey {
    pub fingerprint: Fingerprint,
    pub hosts: Vec<String>,
}

impl DuplicateHostKey {
    /// Builds a record with its hosts sorted ascending.
    pub fn new(fingerprint: Fingerprint, mut hosts: Vec<String>) -> Self {
        hosts.sort();
        Self { fingerprint, hosts }
    }
}

/// Counters describing one completed scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStats {
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    /// Addresses handed to the scheduler.
    pub targets: usize,
    /// Probes that returned a host key.
    pub keys: usize,
    /// Reachable endpoints that never presented a key.
    pub no_key: usize,
    /// Refused, unreachable or timed-out probes.
    pub failures: usize,
    /// Distinct fingerprints recorded.
    pub fingerprints: usize,
}

impl ScanStats {
    pub fn completed(&self) -> usize {
        self.keys + self.no_key + self.failures
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
