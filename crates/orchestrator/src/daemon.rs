use slotrace_metrics::MetricsCollector;
use slotrace_ratelimit::JitterBackoff;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::{DaemonKey, RaceControl, RaceSettings, Session};

/// Pause between two daemon ticks
#[derive(Clone, Copy, Debug)]
pub enum Cadence {
    Fixed(Duration),
    Jittered(JitterBackoff),
}

impl Cadence {
    pub fn next_pause(&self) -> Duration {
        match self {
            Cadence::Fixed(pause) => *pause,
            Cadence::Jittered(backoff) => backoff.next_delay(),
        }
    }
}

/// Background loop refreshing one resource until the run is stopped
///
/// Starting is guarded by the [`RaceControl`] latch for the daemon's key, so
/// at most one loop per resource exists for the life of the process. The loop
/// waits for the start gate before its first tick and checks the stop flag
/// at the head of every iteration.
pub struct RefreshDaemon {
    key: DaemonKey,
    cadence: Cadence,
    control: Arc<RaceControl>,
    metrics: MetricsCollector,
}

impl RefreshDaemon {
    pub fn new(key: DaemonKey, cadence: Cadence, control: Arc<RaceControl>) -> Self {
        Self {
            key,
            cadence,
            control,
            metrics: MetricsCollector::new(),
        }
    }

    /// Spawn the loop; false if a loop for this key was already started
    pub fn start<F, Fut, E>(self, tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let control = self.control.clone();
        let key = self.key;
        control.start_once(key, move || self.run(tick))
    }

    async fn run<F, Fut, E>(self, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let name = self.key.name();
        if !self.control.wait_for_gate().await {
            debug!(daemon = name, "Stopped before the start gate opened");
            return;
        }

        self.metrics.record_daemon_started();
        while !self.control.is_stopped() {
            if let Err(error) = tick().await {
                debug!(daemon = name, error = %error, "Refresh failed");
            }
            self.metrics.record_daemon_tick(name);
            tokio::time::sleep(self.cadence.next_pause()).await;
        }
        self.metrics.record_daemon_stopped();
        debug!(daemon = name, "Daemon exited");
    }
}

/// The session's refresh daemons, each started at most once
pub struct DaemonSet {
    session: Arc<Session>,
    control: Arc<RaceControl>,
    poll: Cadence,
    template: Cadence,
}

impl DaemonSet {
    pub fn new(session: Arc<Session>, control: Arc<RaceControl>, settings: &RaceSettings) -> Self {
        Self {
            session,
            control,
            poll: Cadence::Jittered(JitterBackoff::new(settings.poll_interval)),
            template: Cadence::Fixed(settings.template_refresh),
        }
    }

    fn daemon(&self, key: DaemonKey, cadence: Cadence) -> RefreshDaemon {
        RefreshDaemon::new(key, cadence, self.control.clone())
    }

    /// Keep re-fetching the cart
    pub fn ensure_cart_poller(&self) -> bool {
        let session = self.session.clone();
        let started = self
            .daemon(DaemonKey::CartPoller, self.poll)
            .start(move || {
                let session = session.clone();
                async move { session.fetch_cart().await.map(|_| ()) }
            });
        if started {
            info!("Cart poller started");
        }
        started
    }

    /// Keep re-pricing the order
    pub fn ensure_check_order_poller(&self) -> bool {
        let session = self.session.clone();
        let started = self
            .daemon(DaemonKey::CheckOrderPoller, self.poll)
            .start(move || {
                let session = session.clone();
                async move { session.check_order().await.map(|_| ()) }
            });
        if started {
            info!("Order check poller started");
        }
        started
    }

    /// Keep the prebuilt order-check request current
    pub fn ensure_check_order_template(&self) -> bool {
        let session = self.session.clone();
        let started = self
            .daemon(DaemonKey::CheckOrderTemplate, self.template)
            .start(move || {
                let result = session.refresh_check_order_template();
                async move { result }
            });
        if started {
            info!("Order check template refresher started");
        }
        started
    }

    /// Keep one prebuilt submission per open window current
    pub fn ensure_submit_templates(&self) -> bool {
        let session = self.session.clone();
        let started = self
            .daemon(DaemonKey::SubmitOrderTemplate, self.template)
            .start(move || {
                let result = session.refresh_submit_templates().map(|_| ());
                async move { result }
            });
        if started {
            info!("Submission template refresher started");
        }
        started
    }
}
