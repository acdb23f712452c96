use slotrace_api::Notifier;
use slotrace_metrics::MetricsCollector;
use slotrace_ratelimit::JitterBackoff;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{
    FlowError, FlowSequencer, RaceControl, RaceSettings, RaceSignals, RaceWin, Session,
    SupervisorError,
};

pub const WIN_TITLE: &str = "Delivery slot won";
pub const WIN_BODY: &str = "An order was placed, pay for it as soon as possible";

/// Outer retry loops plus the monitor that decides how the run ends
pub struct ProcessSupervisor {
    session: Arc<Session>,
    control: Arc<RaceControl>,
    notifier: Arc<dyn Notifier>,
    settings: RaceSettings,
    metrics: MetricsCollector,
}

impl ProcessSupervisor {
    pub fn new(
        session: Arc<Session>,
        control: Arc<RaceControl>,
        notifier: Arc<dyn Notifier>,
        settings: RaceSettings,
    ) -> Self {
        Self {
            session,
            control,
            notifier,
            settings,
            metrics: MetricsCollector::new(),
        }
    }

    /// Start the supervisor loops, run the monitor, then stop everything
    pub async fn run(&self, signals: RaceSignals) -> Result<RaceWin, SupervisorError> {
        let loops = self.start();
        let outcome = self.monitor(signals).await;
        self.control.stop();
        for handle in loops {
            handle.abort();
        }
        outcome
    }

    /// Spawn `parallelism` flow loops, staggered by the configured delay
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let flow = Arc::new(FlowSequencer::new(
            self.session.clone(),
            self.control.clone(),
            &self.settings,
        ));

        (0..self.settings.parallelism)
            .map(|index| {
                let flow = flow.clone();
                let control = self.control.clone();
                let metrics = self.metrics;
                let backoff = JitterBackoff::new(self.settings.interval);
                let cooldown = self.settings.fatal_cooldown;
                let delay = self.settings.stagger * index;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    supervise(index, flow, control, metrics, backoff, cooldown).await;
                })
            })
            .collect()
    }

    /// Wait for the first of: run deadline, terminal failure, win
    pub async fn monitor(&self, mut signals: RaceSignals) -> Result<RaceWin, SupervisorError> {
        let max_run = self.settings.max_run;
        tokio::select! {
            _ = tokio::time::sleep(max_run) => {
                error!(max_run_secs = max_run.as_secs(), "Run time limit reached");
                Err(SupervisorError::Timeout(max_run))
            }
            Some(failure) = signals.failed.recv() => Err(SupervisorError::Fatal(failure)),
            Some(win) = signals.won.recv() => {
                self.announce(&win).await;
                Ok(win)
            }
        }
    }

    async fn announce(&self, win: &RaceWin) {
        for _ in 0..self.settings.banner_repeats {
            info!(window = %win.window, price = %win.price, "Slot won, pay for the order now!");
        }

        if !self.notifier.is_configured() {
            warn!("No notification key configured, skipping push notifications");
            return;
        }

        let attempts = self.settings.notify_attempts;
        for attempt in 1..=attempts {
            if let Err(error) = self.notifier.notify(WIN_TITLE, WIN_BODY).await {
                warn!(attempt, error = %error, "Push notification failed");
            }
            if attempt < attempts {
                tokio::time::sleep(self.settings.notify_spacing).await;
            }
        }
    }
}

async fn supervise(
    index: u32,
    flow: Arc<FlowSequencer>,
    control: Arc<RaceControl>,
    metrics: MetricsCollector,
    backoff: JitterBackoff,
    cooldown: Duration,
) {
    while !control.is_stopped() {
        match flow.run_once().await {
            Ok(report) if report.won => metrics.record_flow_cycle("won"),
            Ok(_) => {
                metrics.record_flow_cycle("lost");
                backoff.wait().await;
            }
            Err(failure) if failure.is_unwinnable() => {
                metrics.record_flow_cycle(failure.label());
                error!(
                    loop_index = index,
                    error = %failure,
                    cooldown_secs = cooldown.as_secs(),
                    "Nothing to race for, stopping after cooldown"
                );
                tokio::time::sleep(cooldown).await;
                report(&control, failure);
                return;
            }
            Err(failure) => {
                metrics.record_flow_cycle(failure.label());
                error!(loop_index = index, error = %failure, "Flow cycle failed");
                backoff.wait().await;
            }
        }
    }
}

fn report(control: &RaceControl, failure: FlowError) {
    if !control.report_failure(failure) {
        info!("A terminal failure is already pending");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::StartGate;
    use slotrace_api::{Endpoint, RawResponse};
    use tokio::time::Instant;

    fn settings() -> RaceSettings {
        RaceSettings {
            interval: Duration::from_millis(5),
            stagger: Duration::from_millis(5),
            fatal_cooldown: Duration::from_millis(50),
            max_run: Duration::from_secs(5),
            poll_interval: Duration::from_millis(20),
            notify_attempts: 3,
            notify_spacing: Duration::from_millis(1),
            banner_repeats: 2,
            ..RaceSettings::default()
        }
    }

    fn supervisor(
        transport: Arc<ScriptedTransport>,
        notifier: Arc<RecordingNotifier>,
        gate: StartGate,
        settings: RaceSettings,
    ) -> (ProcessSupervisor, RaceSignals, Arc<RaceControl>) {
        let (control, signals) = RaceControl::new(gate);
        let supervisor =
            ProcessSupervisor::new(fixture_session(transport), control.clone(), notifier, settings);
        (supervisor, signals, control)
    }

    fn script_checkout(transport: &ScriptedTransport) {
        transport.script(Endpoint::Cart, [RawResponse::ok(cart_body(&["p1"]))]);
        transport.script(Endpoint::CheckOrder, [RawResponse::ok(check_order_body("66.00"))]);
        transport.script(
            Endpoint::ReserveTimes,
            [RawResponse::ok(reserve_body(&[(100, 200, 0), (200, 300, 0)]))],
        );
    }

    #[tokio::test]
    async fn test_empty_cart_stops_after_cooldown() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script(Endpoint::Cart, [RawResponse::ok(cart_body(&[]))]);
        let notifier = Arc::new(RecordingNotifier::default());
        let (supervisor, signals, control) =
            supervisor(transport.clone(), notifier.clone(), StartGate::open(), settings());

        let started = Instant::now();
        let result = supervisor.run(signals).await;

        assert!(matches!(
            result,
            Err(SupervisorError::Fatal(FlowError::NoValidProduct))
        ));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(transport.calls_to(Endpoint::SubmitOrder), 0);
        assert_eq!(notifier.count(), 0);
        assert!(control.is_stopped());
    }

    #[tokio::test]
    async fn test_win_is_announced() {
        let transport = Arc::new(ScriptedTransport::new());
        script_checkout(&transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let (supervisor, signals, _control) =
            supervisor(transport.clone(), notifier.clone(), StartGate::open(), settings());

        let win = supervisor.run(signals).await.unwrap();

        assert!(win.price > rust_decimal::Decimal::ZERO);
        assert_eq!(notifier.count(), 3);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent[0], (WIN_TITLE.to_string(), WIN_BODY.to_string()));
    }

    #[tokio::test]
    async fn test_win_without_notification_key() {
        let transport = Arc::new(ScriptedTransport::new());
        script_checkout(&transport);
        let notifier = Arc::new(RecordingNotifier {
            unconfigured: true,
            ..RecordingNotifier::default()
        });
        let (supervisor, signals, _control) =
            supervisor(transport, notifier.clone(), StartGate::open(), settings());

        assert!(supervisor.run(signals).await.is_ok());
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_deadline() {
        let transport = Arc::new(ScriptedTransport::new());
        script_checkout(&transport);
        let gate = StartGate::at(Instant::now() + Duration::from_secs(3600));
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = RaceSettings {
            max_run: Duration::from_millis(80),
            ..settings()
        };
        let (supervisor, signals, control) =
            supervisor(transport.clone(), notifier, gate, settings);

        let result = supervisor.run(signals).await;

        assert!(matches!(result, Err(SupervisorError::Timeout(_))));
        assert!(control.is_stopped());
        assert_eq!(transport.calls_to(Endpoint::SubmitOrder), 0);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        script_checkout(&transport);
        transport.script(
            Endpoint::CartAllCheck,
            [
                RawResponse::new(502, "bad gateway"),
                RawResponse::ok(SUCCESS_BODY),
            ],
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let (supervisor, signals, _control) =
            supervisor(transport.clone(), notifier, StartGate::open(), settings());

        assert!(supervisor.run(signals).await.is_ok());
        assert_eq!(transport.calls_to(Endpoint::CartAllCheck), 2);
    }

    #[tokio::test]
    async fn test_parallel_loops_report_one_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script(Endpoint::Cart, [RawResponse::ok(cart_body(&[]))]);
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = RaceSettings {
            parallelism: 3,
            ..settings()
        };
        let (supervisor, signals, _control) =
            supervisor(transport.clone(), notifier, StartGate::open(), settings);

        let result = supervisor.run(signals).await;

        assert!(matches!(result, Err(SupervisorError::Fatal(_))));
        assert!(transport.calls_to(Endpoint::Cart) >= 1);
    }
}
