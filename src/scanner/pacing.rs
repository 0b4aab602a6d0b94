use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Admits at most `rate` probe starts per second.
///
/// Admissions are spaced `1 / rate` apart; the first is immediate. Tokens are
/// consumed, never returned, and a slow consumer does not earn a burst of
/// catch-up admissions.
pub struct PacingGate {
    ticker: Mutex<Interval>,
    period: Duration,
}

impl PacingGate {
    /// Must be called from within a Tokio runtime.
    pub fn new(rate: NonZeroU32) -> Self {
        let period = Duration::from_nanos(1_000_000_000 / u64::from(rate.get()))
            .max(Duration::from_nanos(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker: Mutex::new(ticker),
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits for the next admission.
    pub async fn admit(&self) {
        self.ticker.lock().await.tick().await;
    }
}
