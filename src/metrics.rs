//! Operational metrics for the downloader
//!
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Prometheus exporter is installed only on request (`--metrics-addr`)
//! - Attempt outcomes, retries, quota usage and request latency

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static METRICS_INITIALIZED: OnceCell<SocketAddr> = OnceCell::new();

/// Fraction of the daily quota at which a warning is logged
const QUOTA_WARN_RATIO: f64 = 0.9;

/// Install the Prometheus exporter and register metric descriptions.
///
/// Idempotent: later calls are ignored once an exporter is installed. Must be
/// called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(existing) = METRICS_INITIALIZED.get() {
        debug!(%existing, "Metrics already initialized, skipping");
        return Ok(());
    }

    info!("Initializing metrics exporter on {}", addr);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "bls_api_attempts_total",
        Unit::Count,
        "Request attempts by outcome (succeeded, retrying, exhausted, fatal)"
    );
    describe_counter!(
        "bls_api_retries_total",
        Unit::Count,
        "Retries scheduled after transient failures"
    );
    describe_histogram!(
        "bls_api_retry_backoff_seconds",
        Unit::Seconds,
        "Backoff slept before a retry"
    );
    describe_histogram!(
        "bls_api_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration"
    );
    describe_counter!(
        "bls_http_responses_total",
        Unit::Count,
        "HTTP responses by status (or network_error)"
    );
    describe_gauge!(
        "bls_quota_calls_today",
        Unit::Count,
        "Calls metered against today's quota"
    );
    describe_gauge!(
        "bls_quota_remaining",
        Unit::Count,
        "Calls left in today's quota"
    );
    describe_counter!(
        "bls_batches_completed_total",
        Unit::Count,
        "Batches that returned a successful response"
    );
    describe_counter!(
        "bls_diagnostics_total",
        Unit::Count,
        "Normalization diagnostics by kind"
    );

    let _ = METRICS_INITIALIZED.set(addr);
    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Timing and status for one HTTP request
pub struct HttpRequestMetrics {
    endpoint: String,
    start_time: Instant,
}

impl HttpRequestMetrics {
    /// Start timing a request
    pub fn start(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            start_time: Instant::now(),
        }
    }

    /// Record a response with an HTTP status
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();
        counter!(
            "bls_http_responses_total",
            "status" => status_code.to_string(),
        )
        .increment(1);
        histogram!(
            "bls_api_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());

        debug!(
            endpoint = %self.endpoint,
            status = status_code,
            duration_ms = duration.as_millis(),
            "HTTP request completed"
        );
    }

    /// Record a request that failed without a status
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();
        counter!(
            "bls_http_responses_total",
            "status" => "network_error",
        )
        .increment(1);
        histogram!(
            "bls_api_request_duration_seconds",
            "endpoint" => self.endpoint.clone(),
        )
        .record(duration.as_secs_f64());

        debug!(
            endpoint = %self.endpoint,
            duration_ms = duration.as_millis(),
            "HTTP request failed without a response"
        );
    }
}

/// Count one attempt outcome
pub fn record_attempt(outcome: &'static str) {
    counter!("bls_api_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a scheduled retry and its backoff
pub fn record_retry_backoff(duration: Duration, attempt: u32) {
    counter!("bls_api_retries_total", "attempt" => attempt.to_string()).increment(1);
    histogram!("bls_api_retry_backoff_seconds").record(duration.as_secs_f64());
}

fn above_warn_threshold(calls: u32, limit: u32) -> bool {
    limit > 0 && calls as f64 >= limit as f64 * QUOTA_WARN_RATIO
}

/// Whether this call should raise the low-quota warning: on the call that
/// crosses 90% of the limit, or on a ledger's first call if already past it
pub fn low_quota_warning_due(calls_today: u32, limit: u32, first_call: bool) -> bool {
    above_warn_threshold(calls_today, limit)
        && (first_call || !above_warn_threshold(calls_today.saturating_sub(1), limit))
}

/// Publish quota usage and warn once when it runs low
pub fn record_quota_usage(calls_today: u32, limit: u32, first_call: bool) {
    let remaining = limit.saturating_sub(calls_today);
    gauge!("bls_quota_calls_today").set(calls_today as f64);
    gauge!("bls_quota_remaining").set(remaining as f64);

    if low_quota_warning_due(calls_today, limit, first_call) {
        warn!(
            calls_today = calls_today,
            limit = limit,
            remaining = remaining,
            "Daily query quota nearly exhausted"
        );
    }
}

/// Count a completed batch
pub fn record_batch_completed() {
    counter!("bls_batches_completed_total").increment(1);
}

/// Count a diagnostic by kind
pub fn record_diagnostic(kind: &'static str) {
    counter!("bls_diagnostics_total", "kind" => kind).increment(1);
}
