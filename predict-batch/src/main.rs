use std::fs::{File, OpenOptions};

use anyhow::Context;
use clap::Parser;
use classifier_core::{Classifier, ClassifierGateway};
use ml_bridge::{BridgeConfig, PythonPipelineLoader};
use tracing::info;

use predict_batch::{BatchRunner, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    classifier_core::init_tracing_from_env("predict-batch");

    let bridge = BridgeConfig::from_env().context("Invalid model sidecar configuration")?;
    let gateway = ClassifierGateway::new(PythonPipelineLoader::new(bridge));

    info!("Warming up the model...");
    gateway.ensure_loaded().await.context("Model failed to load")?;

    let input = File::open(&cli.input.0)
        .with_context(|| format!("Failed to open {}", cli.input.0.display()))?;
    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&cli.output.0)
        .with_context(|| format!("Failed to create {}", cli.output.0.display()))?;

    let summary = BatchRunner::new(&gateway, &cli.labels.0)
        .run(input, output)
        .await?;

    info!(
        rows = summary.rows,
        written = summary.written,
        failed = summary.failed,
        output = %cli.output.0.display(),
        "Batch complete"
    );
    Ok(())
}
