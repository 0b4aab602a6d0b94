//! The concurrent scanning engine.
//!
//! [`ScanScheduler`] drives a [`HostKeyProber`] across every target address
//! under two independent admission controls:
//!
//! | Gate | Mechanism | Released |
//! |------|-----------|----------|
//! | Rate | [`PacingGate`], one start per `1 / rate` seconds | never, tokens are consumed |
//! | Concurrency | `tokio::sync::Semaphore` with `concurrency` permits | when the probe task ends |
//!
//! Each probe runs in its own task and records a retrieved key in the shared
//! [`FingerprintAggregator`]. Once every task has finished the aggregate is
//! frozen and returned in a [`ScanReport`].
//!
//! # Example
//!
//! ```no_run
//! use ssh_key_scanner::prober::SshProber;
//! use ssh_key_scanner::range::expand_cidr;
//! use ssh_key_scanner::scanner::{ScanScheduler, ScanSettings};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ScanSettings::new(100, 50, Duration::from_secs(5))?;
//!     let prober = Arc::new(SshProber::new(22, settings.timeout()));
//!     let scheduler = ScanScheduler::new(prober, settings);
//!
//!     let report = scheduler.run(&expand_cidr("192.168.1.0/24")?).await;
//!     for dup in report.duplicates() {
//!         println!("{} -> {:?}", dup.fingerprint, dup.hosts);
//!     }
//!     Ok(())
//! }
//! ```

mod aggregate;
mod pacing;

pub use aggregate::{FingerprintAggregator, FrozenAggregate};
pub use pacing::PacingGate;

use chrono::Utc;
use std::net::Ipv4Addr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, trace, warn};

use crate::detect::find_duplicates;
use crate::error::{Result, ScanError};
use crate::logging::NO_KEY_TARGET;
use crate::model::{DuplicateHostKey, ScanStats};
use crate::prober::{HostKeyProber, ProbeOutcome};

/// Invoked once per completed probe.
pub type ProgressCallback = Arc<dyn Fn() + Send + Sync>;

/// Validated scheduler parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    rate_limit: NonZeroU32,
    concurrency: usize,
    timeout: Duration,
}

impl ScanSettings {
    pub const DEFAULT_RATE_LIMIT: u32 = 100;
    pub const DEFAULT_CONCURRENCY: usize = 50;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfig`] if the rate limit, concurrency or
    /// timeout is zero, or the concurrency exceeds what a semaphore can hold.
    pub fn new(rate_limit: u32, concurrency: usize, timeout: Duration) -> Result<Self> {
        let rate_limit = NonZeroU32::new(rate_limit).ok_or_else(|| {
            ScanError::InvalidConfig("rate limit must be at least 1 probe per second".into())
        })?;
        if concurrency == 0 {
            return Err(ScanError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        if concurrency > Semaphore::MAX_PERMITS {
            return Err(ScanError::InvalidConfig(format!(
                "concurrency must not exceed {}",
                Semaphore::MAX_PERMITS
            )));
        }
        if timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "probe timeout must be greater than zero".into(),
            ));
        }
        Ok(Self {
            rate_limit,
            concurrency,
            timeout,
        })
    }

    pub fn rate_limit(&self) -> NonZeroU32 {
        self.rate_limit
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            rate_limit: NonZeroU32::new(Self::DEFAULT_RATE_LIMIT).unwrap_or(NonZeroU32::MIN),
            concurrency: Self::DEFAULT_CONCURRENCY,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// Frozen results of one scan.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub aggregate: FrozenAggregate,
    pub stats: ScanStats,
}

impl ScanReport {
    /// Fingerprints shared by more than one address, in deterministic order.
    pub fn duplicates(&self) -> Vec<DuplicateHostKey> {
        find_duplicates(&self.aggregate)
    }
}

#[derive(Default)]
struct Counters {
    keys: AtomicUsize,
    no_key: AtomicUsize,
    failures: AtomicUsize,
}

pub struct ScanScheduler {
    prober: Arc<dyn HostKeyProber>,
    settings: ScanSettings,
    progress: Option<ProgressCallback>,
}

impl ScanScheduler {
    pub fn new(prober: Arc<dyn HostKeyProber>, settings: ScanSettings) -> Self {
        Self {
            prober,
            settings,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Probes every address in `targets` exactly once and waits for all
    /// probes to finish.
    ///
    /// Individual probe failures are logged and counted; they never stop the
    /// scan.
    pub async fn run(&self, targets: &[Ipv4Addr]) -> ScanReport {
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(
            "Scanning {} addresses with {} prober ({} probes/s, {} concurrent)",
            targets.len(),
            self.prober.name(),
            self.settings.rate_limit,
            self.settings.concurrency
        );

        let aggregator = Arc::new(FingerprintAggregator::new());
        let counters = Arc::new(Counters::default());
        let slots = Arc::new(Semaphore::new(self.settings.concurrency));
        let gate = PacingGate::new(self.settings.rate_limit);
        let mut tasks = JoinSet::new();

        for &address in targets {
            let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
                warn!("Slot pool closed, stopping before {}", address);
                break;
            };
            // Admit only once a slot is held, keeping starts 1/R apart.
            gate.admit().await;

            let prober = Arc::clone(&self.prober);
            let aggregator = Arc::clone(&aggregator);
            let counters = Arc::clone(&counters);
            let progress = self.progress.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = prober.probe(address).await;
                record_outcome(address, outcome, &aggregator, &counters);
                if let Some(progress) = progress {
                    progress();
                }
            });

            while let Some(joined) = tasks.try_join_next() {
                report_task_failure(joined);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            report_task_failure(joined);
        }

        let aggregate = match Arc::try_unwrap(aggregator) {
            Ok(aggregator) => aggregator.freeze(),
            Err(shared) => shared.snapshot(),
        };

        let stats = ScanStats {
            started_at,
            elapsed: clock.elapsed(),
            targets: targets.len(),
            keys: counters.keys.load(Ordering::Relaxed),
            no_key: counters.no_key.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
            fingerprints: aggregate.len(),
        };

        info!(
            "Scan finished in {:.1}s: {} keys, {} without key, {} failed",
            stats.elapsed.as_secs_f64(),
            stats.keys,
            stats.no_key,
            stats.failures
        );

        ScanReport { aggregate, stats }
    }
}

fn record_outcome(
    address: Ipv4Addr,
    outcome: ProbeOutcome,
    aggregator: &FingerprintAggregator,
    counters: &Counters,
) {
    match outcome {
        ProbeOutcome::Key(key) => {
            let fingerprint = key.fingerprint();
            debug!("Scanned {}: {}", address, fingerprint);
            aggregator.record(fingerprint, address.to_string());
            counters.keys.fetch_add(1, Ordering::Relaxed);
        }
        ProbeOutcome::NoKey => {
            trace!(target: NO_KEY_TARGET, "No host key found for {}", address);
            counters.no_key.fetch_add(1, Ordering::Relaxed);
        }
        ProbeOutcome::ConnectionError(e) => {
            trace!("Error connecting to {}: {}", address, e);
            counters.failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn report_task_failure(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        warn!("Probe task failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fingerprint, HostKey};
    use crate::prober::ProbeError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns canned outcomes and tracks how many probes overlap.
    struct MockProber {
        outcomes: HashMap<Ipv4Addr, ProbeOutcome>,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<Vec<Ipv4Addr>>,
    }

    impl MockProber {
        fn new(outcomes: HashMap<Ipv4Addr, ProbeOutcome>, delay: Duration) -> Self {
            Self {
                outcomes,
                delay,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HostKeyProber for MockProber {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn probe(&self, address: Ipv4Addr) -> ProbeOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(address);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.outcomes
                .get(&address)
                .cloned()
                .unwrap_or(ProbeOutcome::ConnectionError(ProbeError::Transport(
                    "connection refused".to_string(),
                )))
        }
    }

    fn addr(last: u8) -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, last)
    }

    fn settings(rate: u32, concurrency: usize) -> ScanSettings {
        ScanSettings::new(rate, concurrency, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_settings_reject_zero_values() {
        assert!(matches!(
            ScanSettings::new(0, 50, Duration::from_secs(5)),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(matches!(
            ScanSettings::new(100, 0, Duration::from_secs(5)),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(matches!(
            ScanSettings::new(100, 50, Duration::ZERO),
            Err(ScanError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_settings_default() {
        let settings = ScanSettings::default();
        assert_eq!(settings.rate_limit().get(), 100);
        assert_eq!(settings.concurrency(), 50);
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_scan_groups_shared_keys() {
        let shared = HostKey::new("ssh-ed25519", vec![1, 1, 1]);
        let unique = HostKey::new("ssh-rsa", vec![2, 2, 2]);
        let outcomes = HashMap::from([
            (addr(3), ProbeOutcome::Key(shared.clone())),
            (addr(1), ProbeOutcome::Key(shared.clone())),
            (addr(2), ProbeOutcome::Key(shared.clone())),
            (addr(4), ProbeOutcome::Key(unique.clone())),
            (addr(5), ProbeOutcome::NoKey),
        ]);
        let prober = Arc::new(MockProber::new(outcomes, Duration::ZERO));
        let scheduler = ScanScheduler::new(prober, settings(1000, 4));

        let targets: Vec<_> = (1..=6).map(addr).collect();
        let report = scheduler.run(&targets).await;

        assert_eq!(report.stats.targets, 6);
        assert_eq!(report.stats.keys, 4);
        assert_eq!(report.stats.no_key, 1);
        assert_eq!(report.stats.failures, 1);
        assert_eq!(report.stats.fingerprints, 2);
        assert_eq!(report.stats.completed(), 6);

        let duplicates = report.duplicates();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].fingerprint, shared.fingerprint());
        assert_eq!(duplicates[0].hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert_eq!(
            report.aggregate.hosts(&unique.fingerprint()).unwrap(),
            ["10.0.0.4"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_slots() {
        let prober = Arc::new(MockProber::new(HashMap::new(), Duration::from_millis(20)));
        let scheduler = ScanScheduler::new(prober.clone(), settings(10_000, 3));

        let targets: Vec<_> = (1..=30).map(addr).collect();
        let report = scheduler.run(&targets).await;

        assert_eq!(report.stats.failures, 30);
        let peak = prober.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 3, "peak in-flight was {peak}");
        assert_eq!(prober.in_flight.load(Ordering::SeqCst), 0);

        let mut calls = prober.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, targets);
    }

    #[tokio::test]
    async fn test_rate_limit_spaces_probe_starts() {
        let prober = Arc::new(MockProber::new(HashMap::new(), Duration::ZERO));
        let scheduler = ScanScheduler::new(prober, settings(20, 50));

        let targets: Vec<_> = (1..=10).map(addr).collect();
        let start = Instant::now();
        scheduler.run(&targets).await;

        // (N - 1) / R = 9 / 20 s, less a little scheduling slack.
        assert!(start.elapsed() >= Duration::from_millis(440));
    }

    /// Records when each probe starts; `slow` takes `delay`, the rest return at once.
    struct StaggeredProber {
        slow: Ipv4Addr,
        delay: Duration,
        starts: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl HostKeyProber for StaggeredProber {
        fn name(&self) -> &'static str {
            "staggered"
        }

        async fn probe(&self, address: Ipv4Addr) -> ProbeOutcome {
            self.starts.lock().unwrap().push(Instant::now());
            if address == self.slow {
                tokio::time::sleep(self.delay).await;
            }
            ProbeOutcome::NoKey
        }
    }

    #[tokio::test]
    async fn test_slow_probe_does_not_bunch_later_starts() {
        let prober = Arc::new(StaggeredProber {
            slow: addr(1),
            delay: Duration::from_millis(250),
            starts: Mutex::new(Vec::new()),
        });
        let scheduler = ScanScheduler::new(prober.clone(), settings(10, 1));

        let targets: Vec<_> = (1..=4).map(addr).collect();
        scheduler.run(&targets).await;

        let starts = prober.starts.lock().unwrap().clone();
        assert_eq!(starts.len(), 4);
        for pair in starts.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(gap >= Duration::from_millis(95), "starts only {gap:?} apart");
        }
    }

    #[tokio::test]
    async fn test_progress_ticks_once_per_probe() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let prober = Arc::new(MockProber::new(HashMap::new(), Duration::ZERO));
        let scheduler = ScanScheduler::new(prober, settings(1000, 2)).with_progress(Arc::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));

        let targets: Vec<_> = (1..=12).map(addr).collect();
        scheduler.run(&targets).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn test_empty_target_list() {
        let prober = Arc::new(MockProber::new(HashMap::new(), Duration::ZERO));
        let scheduler = ScanScheduler::new(prober, ScanSettings::default());

        let report = scheduler.run(&[]).await;
        assert!(report.aggregate.is_empty());
        assert!(report.duplicates().is_empty());
        assert_eq!(report.stats.completed(), 0);
    }

    #[tokio::test]
    async fn test_fingerprint_of_recorded_key_is_sha256() {
        let key = HostKey::new("ssh-ed25519", Vec::new());
        let outcomes = HashMap::from([
            (addr(1), ProbeOutcome::Key(key.clone())),
            (addr(2), ProbeOutcome::Key(key)),
        ]);
        let prober = Arc::new(MockProber::new(outcomes, Duration::ZERO));
        let scheduler = ScanScheduler::new(prober, settings(1000, 2));

        let report = scheduler.run(&[addr(1), addr(2)]).await;
        let expected = Fingerprint::from("SHA256:47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU");
        assert_eq!(report.duplicates()[0].fingerprint, expected);
    }
}
