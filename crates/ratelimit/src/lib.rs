//! Request pacing for the slotrace reservation racer
//!
//! - `JitterBackoff`: fixed interval plus up to 50% jitter, used between
//!   congestion retries and between supervisor cycles
//! - `SubmissionThrottle`: process-wide cap on in-flight order submissions

pub mod backoff;
pub mod throttle;

pub use backoff::JitterBackoff;
pub use throttle::{SubmissionThrottle, ThrottleError, ThrottlePermit};
