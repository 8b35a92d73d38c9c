//! Prometheus exporter for the API process
//!
//! The recorder collects everything `classifier_core::metrics` records;
//! the handle is rendered at /metrics.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    classifier_core::metrics::describe();
    tracing::info!("Metrics system initialized");
    Ok(handle)
}
