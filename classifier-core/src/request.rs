use serde::{Deserialize, Serialize};

/// A validated classification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Text to classify
    pub text: String,

    /// Labels the text may be assigned to, in caller order
    pub candidate_labels: Vec<String>,

    /// Correlation token (queue transport only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl PredictionRequest {
    pub fn new(text: impl Into<String>, candidate_labels: Vec<String>) -> Self {
        Self {
            text: text.into(),
            candidate_labels,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The winning label for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,

    /// Confidence in `[0, 1]`
    pub score: f64,
}

/// One label's score as reported by the underlying model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}
