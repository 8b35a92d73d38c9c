use async_trait::async_trait;

use crate::error::ClassifierError;
use crate::request::PredictionResult;

/// Zero-shot classification as seen by the front-ends.
///
/// Front-ends hold a shared `Arc<dyn Classifier>` built once by the binary's
/// `main`, so every transport in a process talks to the same model handle.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Load the model if it is not loaded yet. Idempotent.
    async fn ensure_loaded(&self) -> Result<(), ClassifierError>;

    /// Return the highest-scoring label in `labels` for `text`.
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<PredictionResult, ClassifierError>;
}
