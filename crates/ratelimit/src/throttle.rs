use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Error)]
pub enum ThrottleError {
    #[error("submission throttle is closed")]
    Closed,
}

/// Process-wide cap on concurrently outstanding submissions.
///
/// Callers beyond the cap wait for a permit instead of being rejected; a slot
/// race never drops an attempt, it only queues it behind the ones in flight.
pub struct SubmissionThrottle {
    in_flight: Arc<AtomicU32>,
    peak: AtomicU32,
    semaphore: Arc<Semaphore>,
}

/// Held for the duration of one submission
pub struct ThrottlePermit {
    in_flight: Arc<AtomicU32>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for ThrottlePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SubmissionThrottle {
    pub fn new(max_in_flight: u32) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            in_flight: Arc::new(AtomicU32::new(0)),
            peak: AtomicU32::new(0),
            semaphore: Arc::new(Semaphore::new(max_in_flight as usize)),
        }
    }

    pub async fn acquire(&self) -> Result<ThrottlePermit, ThrottleError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ThrottleError::Closed)?;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        Ok(ThrottlePermit {
            in_flight: self.in_flight.clone(),
            _permit: permit,
        })
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest number of simultaneous submissions observed
    pub fn peak_in_flight(&self) -> u32 {
        self.peak.load(Ordering::Relaxed)
    }

    /// Refuse all future permits; waiters are released with `Closed`
    pub fn close(&self) {
        self.semaphore.close();
        tracing::debug!("Submission throttle closed");
    }
}
