//! Prometheus metrics for Hermes.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `hermes_calls_total` | Counter | `namespace`, `name`, `status` | Calls handled by the router |
//! | `hermes_call_duration_seconds` | Histogram | `namespace`, `name` | Call latency |
//! | `hermes_publish_attempts_total` | Counter | `topic` | Appends tried against the event log |
//! | `hermes_publish_failures_total` | Counter | `topic` | Publishes that exhausted their retries |
//!
//! Recording functions are cheap no-ops until [`init_metrics`] installs the
//! recorder, so libraries call them unconditionally.
//!
//! The exporter does not open a listener: the transport serves
//! [`render_metrics`] on its own `/metrics` route.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Calls handled by the router.
pub const CALLS_TOTAL: &str = "hermes_calls_total";
/// Call latency.
pub const CALL_DURATION_SECONDS: &str = "hermes_call_duration_seconds";
/// Appends tried against the event log.
pub const PUBLISH_ATTEMPTS_TOTAL: &str = "hermes_publish_attempts_total";
/// Publishes that exhausted their retries.
pub const PUBLISH_FAILURES_TOTAL: &str = "hermes_publish_failures_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether metrics are recorded.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Histogram buckets for call duration, in seconds.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_buckets: default_duration_buckets(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_duration_buckets() -> Vec<f64> {
    vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ]
}

/// Installs the Prometheus recorder.
///
/// Calling it again after a successful install is a no-op.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are invalid or
/// another recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(CALL_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(CALLS_TOTAL, "Total number of calls handled, by final status");
    describe_histogram!(CALL_DURATION_SECONDS, "Call duration in seconds");
    describe_counter!(
        PUBLISH_ATTEMPTS_TOTAL,
        "Total number of append attempts against the event log"
    );
    describe_counter!(
        PUBLISH_FAILURES_TOTAL,
        "Total number of publishes that failed after exhausting retries"
    );
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Records a completed call.
pub fn record_call(namespace: &str, name: &str, status: u16, duration: Duration) {
    counter!(
        CALLS_TOTAL,
        "namespace" => namespace.to_string(),
        "name" => name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        CALL_DURATION_SECONDS,
        "namespace" => namespace.to_string(),
        "name" => name.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records one append attempt.
pub fn record_publish_attempt(topic: &str) {
    counter!(PUBLISH_ATTEMPTS_TOTAL, "topic" => topic.to_string()).increment(1);
}

/// Records a publish that gave up.
pub fn record_publish_failure(topic: &str) {
    counter!(PUBLISH_FAILURES_TOTAL, "topic" => topic.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_a_no_op() {
        record_call("files", "usage", 200, Duration::from_millis(3));
        record_publish_attempt("projects");
        record_publish_failure("projects");
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_default_buckets_are_sorted() {
        let buckets = MetricsConfig::default().duration_buckets;
        assert!(buckets.windows(2).all(|w| w[0] < w[1]));
    }
}
