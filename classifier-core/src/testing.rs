//! Deterministic stand-ins for the model seam.
//!
//! `KeywordPipeline` scores a label by counting its cue words in the text
//! (the label itself always counts) and normalising with a softmax, sorted
//! highest first like the real pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ClassifierError;
use crate::gateway::{PipelineLoader, ZeroShotPipeline};
use crate::request::LabelScore;

const CUE_WEIGHT: f64 = 4.0;

/// Counters shared between a loader, its pipeline and the test.
#[derive(Debug, Default)]
pub struct StubCounters {
    loads: AtomicUsize,
    inferences: AtomicUsize,
}

impl StubCounters {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn inferences(&self) -> usize {
        self.inferences.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct KeywordLoader {
    counters: Arc<StubCounters>,
    cues: Vec<(String, Vec<String>)>,
    load_delay: Duration,
    failing_loads: usize,
    fail_inference: bool,
    fail_readiness: bool,
}

impl KeywordLoader {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(StubCounters::default()),
            cues: Vec::new(),
            load_delay: Duration::ZERO,
            failing_loads: 0,
            fail_inference: false,
            fail_readiness: false,
        }
    }

    /// Cues for the happy/sad example used throughout the tests.
    pub fn sentiment() -> Self {
        Self::new()
            .cue("happy", &["great", "good", "love", "wonderful", "glad"])
            .cue("sad", &["terrible", "awful", "hate", "miserable", "bad"])
    }

    pub fn cue(mut self, label: &str, words: &[&str]) -> Self {
        self.cues.push((
            label.to_lowercase(),
            words.iter().map(|w| w.to_lowercase()).collect(),
        ));
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Make the first `count` loads fail.
    pub fn failing_loads(mut self, count: usize) -> Self {
        self.failing_loads = count;
        self
    }

    pub fn failing_inference(mut self) -> Self {
        self.fail_inference = true;
        self
    }

    /// Load succeeds but the pipeline reports itself unable to serve.
    pub fn failing_readiness(mut self) -> Self {
        self.fail_readiness = true;
        self
    }

    pub fn counters(&self) -> Arc<StubCounters> {
        Arc::clone(&self.counters)
    }
}

impl Default for KeywordLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineLoader for KeywordLoader {
    type Pipeline = KeywordPipeline;

    fn model_name(&self) -> &str {
        "keyword-stub"
    }

    async fn load(&self) -> Result<KeywordPipeline, ClassifierError> {
        let attempt = self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if attempt < self.failing_loads {
            return Err(ClassifierError::failure("stub model failed to load"));
        }
        Ok(KeywordPipeline {
            counters: Arc::clone(&self.counters),
            cues: self.cues.clone(),
            fail_inference: self.fail_inference,
            fail_readiness: self.fail_readiness,
        })
    }
}

#[derive(Debug)]
pub struct KeywordPipeline {
    counters: Arc<StubCounters>,
    cues: Vec<(String, Vec<String>)>,
    fail_inference: bool,
    fail_readiness: bool,
}

impl KeywordPipeline {
    fn hits(&self, text: &str, label: &str) -> usize {
        let label = label.to_lowercase();
        let own = usize::from(!label.is_empty() && text.contains(&label));
        let cued = self
            .cues
            .iter()
            .filter(|(cue_label, _)| *cue_label == label)
            .flat_map(|(_, words)| words)
            .filter(|word| text.contains(word.as_str()))
            .count();
        own + cued
    }
}

#[async_trait]
impl ZeroShotPipeline for KeywordPipeline {
    async fn scores(
        &self,
        text: &str,
        labels: &[String],
    ) -> Result<Vec<LabelScore>, ClassifierError> {
        self.counters.inferences.fetch_add(1, Ordering::SeqCst);
        if self.fail_inference {
            return Err(ClassifierError::failure("stub inference failed"));
        }

        let text = text.to_lowercase();
        let logits: Vec<f64> = labels
            .iter()
            .map(|label| CUE_WEIGHT * self.hits(&text, label) as f64)
            .collect();
        let max = logits.iter().copied().fold(f64::MIN, f64::max);
        let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exp.iter().sum();

        let mut scores: Vec<LabelScore> = labels
            .iter()
            .zip(exp)
            .map(|(label, e)| LabelScore::new(label.clone(), e / total))
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scores)
    }

    async fn ensure_ready(&self) -> Result<(), ClassifierError> {
        if self.fail_readiness {
            return Err(ClassifierError::failure("stub model is not ready"));
        }
        Ok(())
    }
}
