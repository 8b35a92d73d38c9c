//! Gateway seam implemented on top of [`PythonWorker`].

use async_trait::async_trait;
use classifier_core::{ClassifierError, LabelScore, PipelineLoader, ZeroShotPipeline};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::workers::{InferenceRequest, InferenceResponse, PythonWorker, PythonWorkerError};

impl From<PythonWorkerError> for ClassifierError {
    fn from(err: PythonWorkerError) -> Self {
        Self::ClassificationFailure(err.to_string())
    }
}

/// Starts the sidecar when the gateway first needs the model.
#[derive(Debug, Clone)]
pub struct PythonPipelineLoader {
    config: BridgeConfig,
}

impl PythonPipelineLoader {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PipelineLoader for PythonPipelineLoader {
    type Pipeline = PythonPipeline;

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn load(&self) -> Result<PythonPipeline, ClassifierError> {
        let worker = PythonWorker::start(&self.config).await?;
        Ok(PythonPipeline {
            worker: Mutex::new(Some(worker)),
            config: self.config.clone(),
        })
    }
}

/// A sidecar slot. Requests are serialised over its single socket.
///
/// The slot is emptied when the worker dies or its connection can no longer
/// be trusted, and refilled with a fresh worker on the next request.
pub struct PythonPipeline {
    worker: Mutex<Option<PythonWorker>>,
    config: BridgeConfig,
}

impl PythonPipeline {
    /// The live worker in `slot`, restarting it first if needed.
    async fn live_worker<'a>(
        &self,
        slot: &'a mut Option<PythonWorker>,
    ) -> Result<&'a mut PythonWorker, ClassifierError> {
        if slot.as_mut().is_some_and(|worker| !worker.is_alive()) {
            warn!("Python worker is no longer running");
            *slot = None;
        }

        let worker = match slot.take() {
            Some(worker) => worker,
            None => {
                info!(model = %self.config.model, "Restarting Python worker");
                PythonWorker::start(&self.config).await?
            }
        };
        Ok(slot.insert(worker))
    }
}

#[async_trait]
impl ZeroShotPipeline for PythonPipeline {
    async fn scores(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError> {
        let request = InferenceRequest::new(text, labels);
        let mut slot = self.worker.lock().await;
        let worker = self.live_worker(&mut slot).await?;

        let result = match self.config.inference_timeout {
            Some(timeout) => worker.infer_with_timeout(&request, timeout).await,
            None => worker.infer(&request).await,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if e.desyncs_connection() {
                    // A reply may still be in flight for this request
                    warn!(error = %e, "Discarding Python worker connection");
                    *slot = None;
                }
                return Err(e.into());
            }
        };
        drop(slot);

        debug!(processing_time_ms = ?response.processing_time_ms, "Worker answered");
        label_scores(labels, response)
    }

    async fn ensure_ready(&self) -> Result<(), ClassifierError> {
        let mut slot = self.worker.lock().await;
        self.live_worker(&mut slot).await.map(|_| ())
    }
}

/// Pair the worker's parallel `labels`/`scores` arrays, checking they
/// describe the labels that were asked for.
fn label_scores(
    requested: &[String],
    response: InferenceResponse,
) -> Result<Vec<LabelScore>, ClassifierError> {
    if response.labels.len() != response.scores.len() {
        return Err(ClassifierError::failure(format!(
            "worker returned {} labels but {} scores",
            response.labels.len(),
            response.scores.len()
        )));
    }
    if let Some(unknown) = response.labels.iter().find(|l| !requested.contains(l)) {
        return Err(ClassifierError::failure(format!(
            "worker returned unrequested label '{unknown}'"
        )));
    }

    Ok(response
        .labels
        .into_iter()
        .zip(response.scores)
        .map(|(label, score)| LabelScore::new(label, score))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_label_scores_keeps_model_order() {
        let response = InferenceResponse {
            labels: labels(&["happy", "sad"]),
            scores: vec![0.97, 0.03],
            ..InferenceResponse::default()
        };
        let scores = label_scores(&labels(&["sad", "happy"]), response).unwrap();
        assert_eq!(scores[0], LabelScore::new("happy", 0.97));
        assert_eq!(scores[1], LabelScore::new("sad", 0.03));
    }

    #[test]
    fn test_label_scores_rejects_mismatched_lengths() {
        let response = InferenceResponse {
            labels: labels(&["happy", "sad"]),
            scores: vec![0.97],
            ..InferenceResponse::default()
        };
        let err = label_scores(&labels(&["sad", "happy"]), response).unwrap_err();
        assert!(matches!(err, ClassifierError::ClassificationFailure(_)));
    }

    #[test]
    fn test_label_scores_rejects_unrequested_label() {
        let response = InferenceResponse {
            labels: labels(&["angry"]),
            scores: vec![1.0],
            ..InferenceResponse::default()
        };
        assert!(label_scores(&labels(&["sad"]), response).is_err());
    }

    #[test]
    fn test_worker_error_becomes_classification_failure() {
        let err: ClassifierError = PythonWorkerError::WorkerError("boom".into()).into();
        assert_eq!(
            err,
            ClassifierError::ClassificationFailure("Worker reported an error: boom".into())
        );
    }
}
