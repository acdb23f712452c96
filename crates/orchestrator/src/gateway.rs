use slotrace_api::{ApiRequest, RawResponse, Transport};
use slotrace_metrics::MetricsCollector;
use slotrace_ratelimit::{JitterBackoff, SubmissionThrottle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::{GatewayError, ResponseClassifier};

/// Performs remote calls with classification-driven retry
///
/// Congestion is absorbed here: the same request is re-sent after a jittered
/// pause until the platform answers with anything else. Every other
/// non-success classification comes back as a [`GatewayError`]. Order
/// submissions additionally hold a permit of the process-wide throttle.
pub struct ExecutionGateway {
    transport: Arc<dyn Transport>,
    classifier: ResponseClassifier,
    backoff: JitterBackoff,
    throttle: SubmissionThrottle,
    metrics: MetricsCollector,
    calls: AtomicU64,
    backoffs: AtomicU64,
}

impl ExecutionGateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        backoff: JitterBackoff,
        throttle: SubmissionThrottle,
    ) -> Self {
        Self {
            transport,
            classifier: ResponseClassifier,
            backoff,
            throttle,
            metrics: MetricsCollector::new(),
            calls: AtomicU64::new(0),
            backoffs: AtomicU64::new(0),
        }
    }

    pub fn backoff(&self) -> &JitterBackoff {
        &self.backoff
    }

    /// Remote calls sent so far, retries included
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Congestion pauses taken so far
    pub fn backoff_count(&self) -> u64 {
        self.backoffs.load(Ordering::Relaxed)
    }

    /// Most order submissions that were ever outstanding at once
    pub fn peak_submissions(&self) -> u32 {
        self.throttle.peak_in_flight()
    }

    /// Refuse further submissions; queued submitters fail with `ThrottleClosed`
    pub fn close_submissions(&self) {
        self.throttle.close();
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<RawResponse, GatewayError> {
        let _permit = if request.endpoint.is_submission() {
            Some(
                self.throttle
                    .acquire()
                    .await
                    .map_err(|_| GatewayError::ThrottleClosed)?,
            )
        } else {
            None
        };

        loop {
            if let Some(tag) = &request.tag {
                info!(
                    window = %tag.window,
                    price = %tag.price,
                    in_flight = self.throttle.in_flight(),
                    "Submitting order"
                );
            }

            let started = Instant::now();
            self.calls.fetch_add(1, Ordering::Relaxed);
            let response = self.transport.send(request).await?;
            let verdict = self.classifier.inspect(&response);
            let classification = verdict.classification;

            let endpoint = request.endpoint.name();
            self.metrics
                .record_gateway_call(endpoint, classification.label(), started.elapsed());

            if classification.is_retryable() {
                let delay = self.backoff.next_delay();
                debug!(
                    endpoint,
                    code = ?verdict.code,
                    msg = verdict.message(),
                    delay_ms = delay.as_millis() as u64,
                    "Congested, retrying"
                );
                self.backoffs.fetch_add(1, Ordering::Relaxed);
                self.metrics.record_congestion_retry(endpoint);
                tokio::time::sleep(delay).await;
                continue;
            }

            return match GatewayError::from_classification(
                classification,
                request.endpoint,
                response.status,
                &response.body,
            ) {
                Some(error) => Err(error),
                None => Ok(response),
            };
        }
    }
}
