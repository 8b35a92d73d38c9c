use std::sync::Arc;

use classifier_core::{Classifier, RequestValidator, Surface};
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The process-wide classifier, built once in `main`
    pub classifier: Arc<dyn Classifier>,

    pub validator: RequestValidator,

    /// Present when the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            classifier,
            validator: RequestValidator::new(Surface::Api),
            metrics,
        }
    }
}
