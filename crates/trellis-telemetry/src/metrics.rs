//! Prometheus metrics for dispatch.
//!
//! The record helpers write through the `metrics` facade and cost nothing
//! until [`init_metrics`] installs the Prometheus recorder. Rendering is left
//! to the embedding server: call [`render_metrics`] from whatever endpoint
//! exposes `/metrics`.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use trellis_telemetry::metrics::{record_dispatch, DispatchOutcome};
//!
//! record_dispatch(DispatchOutcome::Completed, Duration::from_millis(3));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Dispatch counter.
pub const DISPATCH_TOTAL: &str = "trellis_dispatch_total";
/// Dispatch latency histogram.
pub const DISPATCH_DURATION_SECONDS: &str = "trellis_dispatch_duration_seconds";
/// Contract violation counter.
pub const CONTRACT_VIOLATIONS_TOTAL: &str = "trellis_contract_violations_total";
/// Mapped parameter counter.
pub const PARAMETERS_MAPPED_TOTAL: &str = "trellis_parameters_mapped_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether the Prometheus recorder is installed.
    pub enabled: bool,

    /// Buckets for `trellis_dispatch_duration_seconds`.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // 100us .. 1s; dispatch is in-process so buckets start low
            duration_buckets: vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ],
        }
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    /// The endpoint ran and its response went through every chain.
    Completed,
    /// A pipeline request decorator returned a response early.
    ShortCircuited,
    /// An exception decorator turned an error into a response.
    Recovered,
    /// Dispatch returned an error.
    Failed,
}

impl DispatchOutcome {
    /// Label value used on metrics and log lines.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::ShortCircuited => "short_circuited",
            Self::Recovered => "recovered",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installs the global Prometheus recorder.
///
/// Does nothing when metrics are disabled.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if the buckets are invalid or a
/// recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(DISPATCH_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();

    Ok(())
}

/// Returns the installed handle, if any.
pub fn metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Total dispatches by outcome");
    describe_histogram!(DISPATCH_DURATION_SECONDS, "Dispatch duration in seconds");
    describe_counter!(
        CONTRACT_VIOLATIONS_TOTAL,
        "Decorators that returned a value their chain does not accept"
    );
    describe_counter!(
        PARAMETERS_MAPPED_TOTAL,
        "Endpoint parameters converted by a type mapper"
    );
}

/// Records a finished dispatch.
pub fn record_dispatch(outcome: DispatchOutcome, duration: Duration) {
    counter!(DISPATCH_TOTAL, "outcome" => outcome.as_str()).increment(1);
    histogram!(DISPATCH_DURATION_SECONDS, "outcome" => outcome.as_str())
        .record(duration.as_secs_f64());
}

/// Records a contract violation at `stage`.
pub fn record_contract_violation(stage: &'static str) {
    counter!(CONTRACT_VIOLATIONS_TOTAL, "stage" => stage).increment(1);
}

/// Records `count` mapped parameters.
pub fn record_parameters_mapped(count: u64) {
    counter!(PARAMETERS_MAPPED_TOTAL).increment(count);
}
