use std::sync::Arc;

use anyhow::Context;
use classifier_core::{Classifier, ClassifierGateway};
use ml_bridge::{BridgeConfig, PythonPipelineLoader};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use predict_api::{metrics, router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    classifier_core::init_tracing_from_env("predict-api");

    let config = ApiConfig::from_env();
    let bridge = BridgeConfig::from_env().context("Invalid model sidecar configuration")?;

    let metrics = match metrics::init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled");
            None
        }
    };

    let classifier: Arc<dyn Classifier> =
        Arc::new(ClassifierGateway::new(PythonPipelineLoader::new(bridge)));

    // Warm the model up in the background; health checks wait for the same load.
    let warmup = Arc::clone(&classifier);
    tokio::spawn(async move {
        info!("Warming up the model...");
        if let Err(e) = warmup.ensure_loaded().await {
            error!(error = %e, "Model warm-up failed, will retry on next request");
        }
    });

    let app = router(AppState::new(classifier, metrics));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!(bind_addr = %config.bind_addr, "Prediction API starting");

    axum::serve(listener, app).await.context("Server failed")?;
    Ok(())
}
