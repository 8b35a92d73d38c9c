//! Load-once model gateway
//!
//! Model initialisation takes seconds while a prediction takes tens of
//! milliseconds, so the gateway keeps the loaded pipeline for the lifetime of
//! the process. Concurrent first callers of `ensure_loaded` wait on the same
//! in-flight load; a failed load leaves the gateway empty and the next call
//! tries again.
//!
//! The load runs on its own task, so a caller that gives up waiting does not
//! abort it.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::error::ClassifierError;
use crate::metrics;
use crate::request::{LabelScore, PredictionResult};

/// Produces the underlying pipeline. Called at most once per successful load.
#[async_trait]
pub trait PipelineLoader: Send + Sync + 'static {
    type Pipeline: ZeroShotPipeline;

    /// Human-readable model identifier for logs.
    fn model_name(&self) -> &str;

    async fn load(&self) -> Result<Self::Pipeline, ClassifierError>;
}

/// A loaded zero-shot model.
#[async_trait]
pub trait ZeroShotPipeline: Send + Sync + 'static {
    /// Score every label in `labels` against `text`.
    ///
    /// Scores come back in the model's order (highest first for the
    /// Hugging Face pipeline).
    async fn scores(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError>;

    /// Confirm a loaded pipeline can still serve, recovering it if it can.
    async fn ensure_ready(&self) -> Result<(), ClassifierError> {
        Ok(())
    }
}

/// Owns the lazily loaded pipeline and serves predictions from it.
pub struct ClassifierGateway<L: PipelineLoader> {
    loader: Arc<L>,
    pipeline: Arc<OnceCell<L::Pipeline>>,
}

impl<L: PipelineLoader> ClassifierGateway<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            pipeline: Arc::new(OnceCell::new()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.pipeline.initialized()
    }

    async fn pipeline(&self) -> Result<&L::Pipeline, ClassifierError> {
        if let Some(pipeline) = self.pipeline.get() {
            return Ok(pipeline);
        }

        let loader = Arc::clone(&self.loader);
        let cell = Arc::clone(&self.pipeline);
        tokio::spawn(async move {
            cell.get_or_try_init(|| load_pipeline(loader.as_ref()))
                .await
                .map(|_| ())
        })
        .await
        .map_err(|e| ClassifierError::failure(format!("model load task failed: {e}")))??;

        self.pipeline
            .get()
            .ok_or_else(|| ClassifierError::failure("model load finished without a pipeline"))
    }
}

async fn load_pipeline<L: PipelineLoader>(loader: &L) -> Result<L::Pipeline, ClassifierError> {
    info!(model = %loader.model_name(), "Loading zero-shot model");
    let started = Instant::now();

    let pipeline = loader.load().await.map_err(|e| {
        warn!(model = %loader.model_name(), error = %e, "Model load failed");
        e
    })?;

    let elapsed = started.elapsed();
    metrics::record_model_load(elapsed);
    info!(elapsed_ms = elapsed.as_millis() as u64, "Model warm-up time");
    Ok(pipeline)
}

#[async_trait]
impl<L: PipelineLoader> Classifier for ClassifierGateway<L> {
    async fn ensure_loaded(&self) -> Result<(), ClassifierError> {
        self.pipeline().await?.ensure_ready().await
    }

    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<PredictionResult, ClassifierError> {
        if labels.is_empty() {
            return Err(ClassifierError::InvalidArgument(
                "classify requires at least one candidate label".to_string(),
            ));
        }

        let pipeline = self.pipeline().await?;

        let started = Instant::now();
        let scores = pipeline.scores(text, labels).await?;
        let elapsed = started.elapsed();
        metrics::record_prediction(elapsed);
        info!(elapsed_ms = elapsed.as_millis() as u64, "Model prediction time");

        let best = select_best(scores)?;
        debug!(label = %best.label, score = best.score, "Prediction selected");
        Ok(best)
    }
}

/// First maximum wins, so ties resolve to the model's own ordering.
fn select_best(scores: Vec<LabelScore>) -> Result<PredictionResult, ClassifierError> {
    let mut best: Option<LabelScore> = None;
    for candidate in scores {
        if !(0.0..=1.0).contains(&candidate.score) {
            return Err(ClassifierError::failure(format!(
                "model returned out-of-range score {} for label '{}'",
                candidate.score, candidate.label
            )));
        }
        match &best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }

    best.map(|b| PredictionResult {
        label: b.label,
        score: b.score,
    })
    .ok_or_else(|| ClassifierError::failure("model returned no scores"))
}
