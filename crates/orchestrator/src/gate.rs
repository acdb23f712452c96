use chrono::{Local, NaiveDateTime, NaiveTime};
use std::time::Duration;
use tokio::time::Instant;

/// Daily time-of-day gate: nothing is submitted before it opens
///
/// Every waiter sleeps on the same deadline, so the opening salvo of
/// submissions and refresh loops leaves together.
#[derive(Clone, Copy, Debug, Default)]
pub struct StartGate {
    opens_at: Option<Instant>,
}

impl StartGate {
    /// A gate that is already open
    pub fn open() -> Self {
        Self { opens_at: None }
    }

    pub fn at(opens_at: Instant) -> Self {
        Self {
            opens_at: Some(opens_at),
        }
    }

    pub fn is_open(&self) -> bool {
        self.opens_at.map_or(true, |at| Instant::now() >= at)
    }

    /// Resolve once the gate is open
    pub async fn wait(&self) {
        if let Some(at) = self.opens_at {
            tokio::time::sleep_until(at).await;
        }
    }
}

/// Time left until `time` on the day of `now`, `None` once it has passed
pub fn delay_until_today(now: NaiveDateTime, time: NaiveTime) -> Option<Duration> {
    let target = now.date().and_time(time);
    (target - now).to_std().ok().filter(|d| !d.is_zero())
}

/// Time left until the next occurrence of `time`, today or tomorrow
pub fn delay_until_next(now: NaiveDateTime, time: NaiveTime) -> Duration {
    delay_until_today(now, time).unwrap_or_else(|| {
        let target = now.date().and_time(time) + chrono::Duration::days(1);
        (target - now).to_std().unwrap_or_default()
    })
}

/// Launch wake-up and gate opening for one run, both relative to the planning instant
///
/// The gate is resolved against the day the process wakes on, so a run
/// started the evening before still holds its gate until the next morning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchSchedule {
    /// Sleep before starting; zero when there is no launch time
    pub wake_in: Duration,
    /// Delay until the gate opens, `None` when it is open at wake-up
    pub gate_in: Option<Duration>,
}

impl LaunchSchedule {
    pub fn plan(
        now: NaiveDateTime,
        launch_at: Option<NaiveTime>,
        gate_at: Option<NaiveTime>,
    ) -> Self {
        let wake_in = launch_at.map_or(Duration::ZERO, |time| delay_until_next(now, time));
        let wake = chrono::Duration::from_std(wake_in)
            .map(|delta| now + delta)
            .unwrap_or(now);
        let gate_in = gate_at
            .and_then(|time| delay_until_today(wake, time))
            .map(|delay| wake_in + delay);
        Self { wake_in, gate_in }
    }

    /// Plan against the local clock
    pub fn local(launch_at: Option<NaiveTime>, gate_at: Option<NaiveTime>) -> Self {
        Self::plan(Local::now().naive_local(), launch_at, gate_at)
    }

    /// The start gate for this schedule, anchored at `planned_at`
    pub fn gate(&self, planned_at: Instant) -> StartGate {
        self.gate_in
            .map_or_else(StartGate::open, |delay| StartGate::at(planned_at + delay))
    }

    pub async fn wait_for_launch(&self) {
        if self.wake_in.is_zero() {
            return;
        }
        tracing::info!(wait_secs = self.wake_in.as_secs(), "Waiting for launch time");
        tokio::time::sleep(self.wake_in).await;
    }
}
