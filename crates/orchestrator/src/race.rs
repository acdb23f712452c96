use futures::future::join_all;
use slotrace_metrics::MetricsCollector;
use slotrace_types::{PackageOrder, ReserveTime};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{DaemonSet, RaceControl, RaceError, RaceWin, Session};

/// Tally of one race
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaceReport {
    /// Submissions actually sent
    pub attempts: usize,
    pub failures: usize,
    /// Participants released by the stop flag before submitting
    pub cancelled: usize,
    pub won: bool,
}

enum Attempt {
    Won,
    Lost(String),
    Cancelled,
}

/// Fans out one submission per open window (times the multiplier)
///
/// Every participant owns a copy of the package order bound to its window.
/// The first success records the win and stops the run; the remaining
/// participants finish on their own and their results are only tallied.
pub struct SlotRaceCoordinator {
    session: Arc<Session>,
    control: Arc<RaceControl>,
    daemons: Arc<DaemonSet>,
    multiplier: u32,
    metrics: MetricsCollector,
}

impl SlotRaceCoordinator {
    pub fn new(
        session: Arc<Session>,
        control: Arc<RaceControl>,
        daemons: Arc<DaemonSet>,
        multiplier: u32,
    ) -> Self {
        Self {
            session,
            control,
            daemons,
            multiplier: multiplier.max(1),
            metrics: MetricsCollector::new(),
        }
    }

    pub async fn race(&self, windows: &[ReserveTime]) -> Result<RaceReport, RaceError> {
        if windows.is_empty() {
            debug!("No windows to race for");
            return Ok(RaceReport::default());
        }

        self.daemons.ensure_submit_templates();
        let base = self.session.snapshot().package_order.clone();

        let mut handles = Vec::with_capacity(windows.len() * self.multiplier as usize);
        for _ in 0..self.multiplier {
            for window in windows {
                let package_order = base.with_window(window);
                let session = self.session.clone();
                let control = self.control.clone();
                let metrics = self.metrics;
                handles.push(tokio::spawn(async move {
                    attempt(session, control, metrics, package_order).await
                }));
            }
        }

        let mut report = RaceReport::default();
        let mut last_error = String::new();
        for outcome in join_all(handles).await {
            match outcome {
                Ok(Attempt::Won) => {
                    report.attempts += 1;
                    report.won = true;
                }
                Ok(Attempt::Lost(error)) => {
                    report.attempts += 1;
                    report.failures += 1;
                    last_error = error;
                }
                Ok(Attempt::Cancelled) => report.cancelled += 1,
                Err(join_error) => {
                    report.failures += 1;
                    last_error = join_error.to_string();
                }
            }
        }
        report.won |= self.control.has_winner();

        debug!(
            attempts = report.attempts,
            failures = report.failures,
            cancelled = report.cancelled,
            won = report.won,
            "Race finished"
        );

        if report.won || report.failures == 0 {
            Ok(report)
        } else {
            Err(RaceError::NoWinner {
                attempts: report.attempts,
                last_error,
            })
        }
    }
}

async fn attempt(
    session: Arc<Session>,
    control: Arc<RaceControl>,
    metrics: MetricsCollector,
    package_order: PackageOrder,
) -> Attempt {
    if !control.wait_for_gate().await {
        return Attempt::Cancelled;
    }

    let window = package_order.window().label();
    metrics.record_race_attempt();
    match session.submit_order(&package_order).await {
        Ok(tag) => {
            let first = control.record_win(RaceWin {
                window: tag.window.clone(),
                price: tag.price,
            });
            control.stop();
            if first {
                metrics.record_race_win();
                info!(window = %tag.window, price = %tag.price, "Order submitted, slot won");
            } else {
                debug!(window = %tag.window, "Order submitted after the race was won");
            }
            Attempt::Won
        }
        Err(error) => {
            metrics.record_race_failure();
            warn!(window = %window, error = %error, "Order submission failed");
            Attempt::Lost(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::{RaceSettings, StartGate};
    use slotrace_api::{Endpoint, RawResponse};
    use std::time::Duration;
    use tokio::time::Instant;

    fn coordinator(
        transport: Arc<ScriptedTransport>,
        gate: StartGate,
        multiplier: u32,
    ) -> (SlotRaceCoordinator, Arc<RaceControl>, crate::RaceSignals) {
        let session = fixture_session(transport);
        let (control, signals) = RaceControl::new(gate);
        let settings = RaceSettings::default();
        let daemons = Arc::new(DaemonSet::new(session.clone(), control.clone(), &settings));
        let coordinator = SlotRaceCoordinator::new(session, control.clone(), daemons, multiplier);
        (coordinator, control, signals)
    }

    fn windows(n: i64) -> Vec<ReserveTime> {
        (0..n)
            .map(|i| ReserveTime::new(1_000 + i * 100, 1_100 + i * 100, format!("slot {i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_window_list_submits_nothing() {
        let transport = Arc::new(ScriptedTransport::new());
        let (coordinator, control, _signals) =
            coordinator(transport.clone(), StartGate::open(), 3);

        let report = tokio::time::timeout(Duration::from_secs(1), coordinator.race(&[]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report, RaceReport::default());
        assert_eq!(transport.calls_to(Endpoint::SubmitOrder), 0);
        assert!(!control.was_started(crate::DaemonKey::SubmitOrderTemplate));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_first_success_wins_and_stops() {
        let transport = Arc::new(ScriptedTransport::new());
        let (coordinator, control, mut signals) =
            coordinator(transport.clone(), StartGate::open(), 1);

        let report = coordinator.race(&windows(3)).await.unwrap();

        assert!(report.won);
        assert!(control.is_stopped());
        assert!(signals.won.recv().await.is_some());
        assert!(signals.won.try_recv().is_err());
        assert_eq!(
            report.attempts + report.cancelled,
            3,
            "every participant is accounted for"
        );
    }

    #[tokio::test]
    async fn test_all_windows_lost() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script(
            Endpoint::SubmitOrder,
            [RawResponse::ok(r#"{"code":-1,"msg":"sold out"}"#)],
        );
        let (coordinator, control, _signals) =
            coordinator(transport.clone(), StartGate::open(), 2);

        let err = coordinator.race(&windows(2)).await.unwrap_err();

        let RaceError::NoWinner {
            attempts,
            last_error,
        } = err;
        assert_eq!(attempts, 4);
        assert!(last_error.contains("sold out"));
        assert_eq!(transport.calls_to(Endpoint::SubmitOrder), 4);
        assert!(!control.is_stopped());
        assert!(!control.has_winner());
    }

    #[tokio::test]
    async fn test_participants_wait_for_gate() {
        let transport = Arc::new(ScriptedTransport::new());
        let opens_at = Instant::now() + Duration::from_millis(50);
        let (coordinator, _control, _signals) =
            coordinator(transport.clone(), StartGate::at(opens_at), 1);

        let report = coordinator.race(&windows(2)).await.unwrap();

        assert!(Instant::now() >= opens_at);
        assert!(report.won);
    }

    #[tokio::test]
    async fn test_stopped_race_cancels_participants() {
        let transport = Arc::new(ScriptedTransport::new());
        let gate = StartGate::at(Instant::now() + Duration::from_secs(3600));
        let (coordinator, control, _signals) = coordinator(transport.clone(), gate, 1);

        let stopper = {
            let control = control.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                control.stop();
            })
        };
        let report = coordinator.race(&windows(3)).await.unwrap();
        stopper.await.unwrap();

        assert_eq!(report.cancelled, 3);
        assert_eq!(report.attempts, 0);
        assert!(!report.won);
        assert_eq!(transport.calls_to(Endpoint::SubmitOrder), 0);
    }
}
