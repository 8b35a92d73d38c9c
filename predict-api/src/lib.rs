//! Prediction HTTP API
//!
//! Endpoints:
//! - GET / , /ping , /health_check - Load the model if needed, then report success
//! - POST /predict - Classify `{"text", "candidate_labels"}`
//! - GET /metrics - Prometheus metrics (when the exporter is installed)
//!
//! Every error response is JSON: `{"code", "name", "description"}`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::health_check))
        .route("/ping", get(handlers::health_check))
        .route("/health_check", get(handlers::health_check))
        .route("/predict", post(handlers::predict));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
