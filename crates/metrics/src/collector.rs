use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use crate::metrics::*;

/// Facade over the process-wide slotrace metrics
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // GATEWAY METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record one remote call and how its response was classified
    pub fn record_gateway_call(&self, endpoint: &str, classification: &str, latency: Duration) {
        GATEWAY_CALLS
            .with_label_values(&[endpoint, classification])
            .inc();
        GATEWAY_LATENCY
            .with_label_values(&[endpoint])
            .observe(latency.as_secs_f64() * 1000.0);
    }

    pub fn record_congestion_retry(&self, endpoint: &str) {
        CONGESTION_RETRIES.with_label_values(&[endpoint]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RACE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_race_attempt(&self) {
        RACE_ATTEMPTS.inc();
    }

    pub fn record_race_failure(&self) {
        RACE_FAILURES.inc();
    }

    pub fn record_race_win(&self) {
        RACE_WINS.inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DAEMON / FLOW METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_daemon_tick(&self, daemon: &str) {
        DAEMON_TICKS.with_label_values(&[daemon]).inc();
    }

    pub fn record_daemon_started(&self) {
        DAEMONS_ACTIVE.inc();
    }

    pub fn record_daemon_stopped(&self) {
        DAEMONS_ACTIVE.dec();
    }

    /// Record the end of a flow cycle (`won`, `lost`, `unwinnable`, `error`)
    pub fn record_flow_cycle(&self, outcome: &str) {
        FLOW_CYCLES.with_label_values(&[outcome]).inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics encoding error: {0}")]
    EncodingError(String),
}
