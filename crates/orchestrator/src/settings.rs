use std::time::Duration;

/// Timing and fan-out knobs for a run
#[derive(Clone, Debug)]
pub struct RaceSettings {
    /// Base of every jittered backoff (congestion and flow retries)
    pub interval: Duration,

    /// Redundant submissions per open window
    pub slot_multiplier: u32,

    /// Concurrent supervisor loops
    pub parallelism: u32,

    /// Delay between supervisor loop starts
    pub stagger: Duration,

    /// Pause before reporting an unwinnable cycle
    pub fatal_cooldown: Duration,

    /// Hard limit for the whole run
    pub max_run: Duration,

    /// Base pause of the cart and order-check pollers
    pub poll_interval: Duration,

    /// Pause between request template rebuilds
    pub template_refresh: Duration,

    pub max_in_flight_submissions: u32,

    pub banner_repeats: u32,

    pub notify_attempts: u32,

    pub notify_spacing: Duration,
}

impl RaceSettings {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_multiplier(mut self, slot_multiplier: u32) -> Self {
        self.slot_multiplier = slot_multiplier.max(1);
        self
    }

    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            slot_multiplier: 1,
            parallelism: 1,
            stagger: Duration::from_millis(400),
            fatal_cooldown: Duration::from_secs(10),
            max_run: Duration::from_secs(8 * 60),
            poll_interval: Duration::from_millis(200),
            template_refresh: Duration::from_millis(1),
            max_in_flight_submissions: 64,
            banner_repeats: 10,
            notify_attempts: 120,
            notify_spacing: Duration::from_secs(2),
        }
    }
}
