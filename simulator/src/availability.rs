use crate::timing::Timing;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Source of wall-clock time, in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Outcome of admitting a segment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The segment is live, or becomes live after the given wait.
    Wait(Duration),
    /// The segment is further in the future than the configured bound.
    TooEarly(Duration),
}

/// Holds segment requests back until the segment's nominal start has passed.
/// Stale segments are always served: content is synthesized, never evicted.
#[derive(Clone)]
pub struct AvailabilityGate {
    timing: Timing,
    clock: Arc<dyn Clock + Send + Sync>,
    max_wait: Option<Duration>,
}

impl AvailabilityGate {
    pub fn new(timing: Timing, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            timing,
            clock,
            max_wait: None,
        }
    }

    /// Rejects requests that would have to wait longer than `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Time left until segment `n` becomes available, zero if it already is.
    pub fn delay(&self, n: u64) -> Duration {
        let due = self.timing.segment_start(n).unwrap_or(u64::MAX);
        let now = self.clock.now_ms();
        Duration::from_millis(due.saturating_sub(now))
    }

    pub fn admit(&self, n: u64) -> Admission {
        let delay = self.delay(n);
        match self.max_wait {
            Some(max_wait) if delay > max_wait => Admission::TooEarly(delay),
            _ => Admission::Wait(delay),
        }
    }

    /// Blocks the calling thread for `delay`.
    pub fn wait_blocking(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }

        debug!("waiting {}ms for availability", delay.as_millis());
        std::thread::sleep(delay);
    }

    /// Suspends the calling task for `delay` without occupying a worker thread.
    /// Dropping the future cancels the wait.
    pub async fn wait(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }

        debug!("waiting {}ms for availability", delay.as_millis());
        tokio::time::sleep(delay).await;
    }
}
