//! Classifier Core Library
//!
//! Shared by every zero-shot classification front-end (HTTP, batch, queue):
//! - Request data model and validation
//! - The `Classifier` seam and the load-once `ClassifierGateway`
//! - Error taxonomy
//! - Tracing bootstrap and metric helpers

pub mod classifier;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod request;
pub mod validate;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used items
pub use classifier::Classifier;
pub use error::ClassifierError;
pub use gateway::{ClassifierGateway, PipelineLoader, ZeroShotPipeline};
pub use request::{LabelScore, PredictionRequest, PredictionResult};
pub use validate::{RequestValidator, Surface, MAX_CANDIDATE_LABELS};

/// Initialize tracing with standard configuration
pub fn init_tracing(service_name: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();
}

/// Initialize tracing with JSON output (for production)
pub fn init_tracing_json(service_name: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();
}

/// Initialize tracing, choosing JSON output when `LOG_FORMAT=json`.
pub fn init_tracing_from_env(service_name: &str) {
    match std::env::var("LOG_FORMAT") {
        Ok(format) if format.eq_ignore_ascii_case("json") => init_tracing_json(service_name),
        _ => init_tracing(service_name),
    }
}

fn default_directives(service_name: &str) -> String {
    let target = service_name.replace('-', "_");
    format!("{target}=info,classifier_core=info,ml_bridge=info,tower_http=debug")
}
