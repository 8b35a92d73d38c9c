use std::sync::Arc;

use anyhow::Context;
use classifier_core::{Classifier, ClassifierGateway};
use ml_bridge::{BridgeConfig, PythonPipelineLoader};
use tracing::{error, info};

use predict_worker::{RedisQueue, Worker, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    classifier_core::init_tracing_from_env("predict-worker");

    let config = WorkerConfig::from_env()?;
    let bridge = BridgeConfig::from_env().context("Invalid model sidecar configuration")?;

    let queue = RedisQueue::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;

    let classifier: Arc<dyn Classifier> =
        Arc::new(ClassifierGateway::new(PythonPipelineLoader::new(bridge)));

    info!("Warming up the model...");
    if let Err(e) = classifier.ensure_loaded().await {
        error!(error = %e, "Model warm-up failed, will retry on next request");
    }

    Worker::from_config(queue, classifier, &config).run().await;
    Ok(())
}
