//! Metric recording helpers
//!
//! Uses the `metrics` facade; nothing is exported unless the binary installs
//! a recorder (predict-api serves Prometheus text at /metrics).

use ::metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

use crate::validate::Surface;

/// Metric names
pub const MODEL_LOAD_SECONDS: &str = "classifier_model_load_seconds";
pub const PREDICTION_SECONDS: &str = "classifier_prediction_seconds";
pub const REQUESTS_TOTAL: &str = "classifier_requests_total";

/// Outcome label for [`REQUESTS_TOTAL`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Rejected,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    describe_histogram!(MODEL_LOAD_SECONDS, "Time spent loading the zero-shot model");
    describe_histogram!(PREDICTION_SECONDS, "Model inference latency in seconds");
    describe_counter!(REQUESTS_TOTAL, "Classification requests by front-end and outcome");
}

pub fn record_model_load(duration: Duration) {
    histogram!(MODEL_LOAD_SECONDS).record(duration.as_secs_f64());
}

pub fn record_prediction(duration: Duration) {
    histogram!(PREDICTION_SECONDS).record(duration.as_secs_f64());
}

pub fn record_request(surface: Surface, outcome: Outcome) {
    counter!(
        REQUESTS_TOTAL,
        "surface" => surface.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}
