//! Observability for Trellis.
//!
//! - **Logging**: structured logs through `tracing-subscriber`, JSON in
//!   production and pretty-printed in development
//! - **Metrics**: dispatch counters exported in Prometheus format
//!
//! The pipeline crates only ever call the `tracing` macros and the record
//! helpers in [`metrics`]. Both are no-ops until a subscriber or recorder is
//! installed, so initializing telemetry is optional.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `trellis_dispatch_total` | Counter | `outcome` | Dispatches by outcome |
//! | `trellis_dispatch_duration_seconds` | Histogram | `outcome` | Dispatch latency |
//! | `trellis_contract_violations_total` | Counter | `stage` | Chain contract violations |
//! | `trellis_parameters_mapped_total` | Counter | - | Parameters converted by type mappers |
//!
//! # Example
//!
//! ```rust,no_run
//! use trellis_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::development(), &MetricsConfig::default())?;
//! tracing::info!("telemetry ready");
//! # Ok::<(), trellis_telemetry::TelemetryError>(())
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, render_metrics, DispatchOutcome, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns the first subsystem failure.
pub fn init_telemetry(logging: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(logging)?;
    init_metrics(metrics)?;
    Ok(())
}
