use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // GATEWAY METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Remote calls by endpoint and classification of the response
    pub static ref GATEWAY_CALLS: IntCounterVec = register_int_counter_vec!(
        "slotrace_gateway_calls_total",
        "Total remote calls by endpoint and response classification",
        &["endpoint", "classification"]
    )
    .unwrap();

    /// Backoff sleeps caused by congestion responses
    pub static ref CONGESTION_RETRIES: IntCounterVec = register_int_counter_vec!(
        "slotrace_congestion_retries_total",
        "Total congestion backoffs by endpoint",
        &["endpoint"]
    )
    .unwrap();

    /// Round-trip latency of a single remote call
    pub static ref GATEWAY_LATENCY: HistogramVec = register_histogram_vec!(
        "slotrace_gateway_latency_ms",
        "Remote call latency in milliseconds",
        &["endpoint"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0]
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // RACE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Submission tasks spawned
    pub static ref RACE_ATTEMPTS: IntCounter = register_int_counter!(
        "slotrace_race_attempts_total",
        "Total order submission attempts"
    )
    .unwrap();

    /// Submission tasks that ended without an order
    pub static ref RACE_FAILURES: IntCounter = register_int_counter!(
        "slotrace_race_failures_total",
        "Total order submission attempts that failed"
    )
    .unwrap();

    /// Submissions accepted by the platform
    pub static ref RACE_WINS: IntCounter = register_int_counter!(
        "slotrace_race_wins_total",
        "Total accepted order submissions"
    )
    .unwrap();

    // ═══════════════════════════════════════════════════════════════════════════
    // DAEMON / FLOW METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Iterations of each background refresh loop
    pub static ref DAEMON_TICKS: IntCounterVec = register_int_counter_vec!(
        "slotrace_daemon_ticks_total",
        "Total refresh loop iterations by daemon",
        &["daemon"]
    )
    .unwrap();

    /// Refresh loops currently running
    pub static ref DAEMONS_ACTIVE: IntGauge = register_int_gauge!(
        "slotrace_daemons_active",
        "Number of refresh loops currently running"
    )
    .unwrap();

    /// Flow cycles by outcome
    pub static ref FLOW_CYCLES: IntCounterVec = register_int_counter_vec!(
        "slotrace_flow_cycles_total",
        "Total flow cycles by outcome",
        &["outcome"]
    )
    .unwrap();
}
