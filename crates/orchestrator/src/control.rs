use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{FlowError, StartGate};

/// Resources kept fresh by a background loop; at most one loop each per process
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DaemonKey {
    CartPoller,
    CheckOrderPoller,
    CheckOrderTemplate,
    SubmitOrderTemplate,
}

impl DaemonKey {
    pub fn name(&self) -> &'static str {
        match self {
            DaemonKey::CartPoller => "cart_poller",
            DaemonKey::CheckOrderPoller => "check_order_poller",
            DaemonKey::CheckOrderTemplate => "check_order_template",
            DaemonKey::SubmitOrderTemplate => "submit_order_template",
        }
    }
}

/// The window and price of the submission that won
#[derive(Clone, Debug, PartialEq)]
pub struct RaceWin {
    pub window: String,
    pub price: Decimal,
}

/// Process-wide "won" signal, set at most once
///
/// The compare-and-swap decides the single logical winner; the channel only
/// wakes the monitor, and its one-slot buffer turns late writes into no-ops.
pub struct RaceOutcome {
    won: AtomicBool,
    tx: mpsc::Sender<RaceWin>,
}

impl RaceOutcome {
    fn new(tx: mpsc::Sender<RaceWin>) -> Self {
        Self {
            won: AtomicBool::new(false),
            tx,
        }
    }

    /// Returns true only for the first caller
    pub fn record(&self, win: RaceWin) -> bool {
        if self
            .won
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let _ = self.tx.try_send(win);
        true
    }

    pub fn is_won(&self) -> bool {
        self.won.load(Ordering::Acquire)
    }
}

/// Receiving ends of the win and failure signals, owned by the monitor
pub struct RaceSignals {
    pub won: mpsc::Receiver<RaceWin>,
    pub failed: mpsc::Receiver<FlowError>,
}

/// Coordination handle shared by every task of a run
///
/// Carries the cooperative stop flag, the once-per-process daemon latches,
/// the win and failure signals and the daily start gate. Constructed once and
/// passed explicitly to every component.
pub struct RaceControl {
    stop_tx: watch::Sender<bool>,
    daemons: Mutex<HashMap<DaemonKey, JoinHandle<()>>>,
    active: Arc<AtomicUsize>,
    outcome: RaceOutcome,
    failure_tx: mpsc::Sender<FlowError>,
    gate: StartGate,
}

impl RaceControl {
    pub fn new(gate: StartGate) -> (Arc<Self>, RaceSignals) {
        let (won_tx, won_rx) = mpsc::channel(1);
        let (failure_tx, failure_rx) = mpsc::channel(1);
        let (stop_tx, _) = watch::channel(false);

        let control = Arc::new(Self {
            stop_tx,
            daemons: Mutex::new(HashMap::new()),
            active: Arc::new(AtomicUsize::new(0)),
            outcome: RaceOutcome::new(won_tx),
            failure_tx,
            gate,
        });
        let signals = RaceSignals {
            won: won_rx,
            failed: failure_rx,
        };
        (control, signals)
    }

    pub fn gate(&self) -> &StartGate {
        &self.gate
    }

    pub fn stop(&self) {
        if !self.stop_tx.send_replace(true) {
            debug!("Stop flag set");
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Resolve once the stop flag is set
    pub async fn stopped(&self) {
        let mut rx = self.stop_tx.subscribe();
        // the sender lives as long as self
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    /// Wait for the start gate; false if the run was stopped first
    pub async fn wait_for_gate(&self) -> bool {
        if self.is_stopped() {
            return false;
        }
        tokio::select! {
            _ = self.gate.wait() => !self.is_stopped(),
            _ = self.stopped() => false,
        }
    }

    /// Record a win; true only for the first winner
    pub fn record_win(&self, win: RaceWin) -> bool {
        self.outcome.record(win)
    }

    pub fn has_winner(&self) -> bool {
        self.outcome.is_won()
    }

    /// Report a terminal flow failure to the monitor; false if one is already pending
    pub fn report_failure(&self, error: FlowError) -> bool {
        self.failure_tx.try_send(error).is_ok()
    }

    /// Spawn the loop for `key` unless one was already started in this process
    ///
    /// The latch is never reset: a loop that has exited is not restarted.
    pub fn start_once<F, Fut>(&self, key: DaemonKey, loop_fn: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut daemons = self.daemons();
        if daemons.contains_key(&key) {
            return false;
        }

        let active = self.active.clone();
        active.fetch_add(1, Ordering::SeqCst);
        let body = loop_fn();
        let handle = tokio::spawn(async move {
            body.await;
            active.fetch_sub(1, Ordering::SeqCst);
        });
        daemons.insert(key, handle);
        debug!(daemon = key.name(), "Daemon started");
        true
    }

    pub fn was_started(&self, key: DaemonKey) -> bool {
        self.daemons().contains_key(&key)
    }

    /// Loops spawned through [`RaceControl::start_once`] that have not exited
    pub fn active_daemons(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn daemons(&self) -> MutexGuard<'_, HashMap<DaemonKey, JoinHandle<()>>> {
        self.daemons.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
