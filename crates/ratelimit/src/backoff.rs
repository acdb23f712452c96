use rand::Rng;
use std::time::Duration;

/// Fixed-interval backoff with up to 50% random jitter.
///
/// Every delay is `interval + random(0, interval / 2)`. There is no growth
/// between attempts: congestion on the remote side is expected to clear on
/// its own, and the jitter keeps parallel callers from retrying in lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterBackoff {
    interval: Duration,
}

impl JitterBackoff {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound (exclusive) of the jitter added to the base interval
    pub fn max_jitter(&self) -> Duration {
        self.interval / 2
    }

    pub fn next_delay(&self) -> Duration {
        self.next_delay_with(&mut rand::thread_rng())
    }

    pub fn next_delay_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter_ms = self.max_jitter().as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rng.gen_range(0..jitter_ms)
        };
        self.interval + Duration::from_millis(jitter)
    }

    /// Sleep for one jittered delay
    pub async fn wait(&self) {
        tokio::time::sleep(self.next_delay()).await;
    }
}

impl Default for JitterBackoff {
    fn default() -> Self {
        Self::from_millis(200)
    }
}
