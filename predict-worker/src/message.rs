//! Per-message request handling.
//!
//! The correlation `id` is read before validation so that a structurally
//! invalid request still gets a correlated error reply.

use classifier_core::{Classifier, ClassifierError, RequestValidator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Successful prediction pushed to the response channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueReply {
    pub label: String,
    pub score: f64,
    pub id: String,
}

/// Error pushed to the response channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueErrorReply {
    /// Absent only when the message could not be parsed at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub error: String,
}

/// Why a message did not produce a prediction
#[derive(Debug)]
pub enum MessageFailure {
    /// Not JSON, so no `id` could be read
    Unparseable(serde_json::Error),
    /// Schema violation or too many labels
    Rejected { id: String, error: ClassifierError },
    /// Model load or inference failed
    Failed { id: String, error: ClassifierError },
}

impl MessageFailure {
    pub fn to_reply(&self) -> QueueErrorReply {
        match self {
            Self::Unparseable(e) => QueueErrorReply {
                id: None,
                error: format!("Unparseable message: {e}"),
            },
            Self::Rejected { id, error } | Self::Failed { id, error } => QueueErrorReply {
                id: Some(id.clone()),
                error: error.to_string(),
            },
        }
    }
}

/// The request's `id`, or a fresh UUID when it has none.
///
/// Non-string ids are kept in their JSON text form.
pub fn correlation_id(value: &Value) -> String {
    match value.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Null) | None => Uuid::new_v4().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Parse, validate and classify one raw queue message.
pub async fn handle_message(
    classifier: &dyn Classifier,
    validator: &RequestValidator,
    raw: &[u8],
) -> Result<QueueReply, MessageFailure> {
    let value: Value = serde_json::from_slice(raw).map_err(MessageFailure::Unparseable)?;
    let id = correlation_id(&value);

    let request = match validator.parse(value) {
        Ok(request) => request.with_id(id),
        Err(error) => return Err(MessageFailure::Rejected { id, error }),
    };
    let id = request.id.unwrap_or_default();

    match classifier
        .classify(&request.text, &request.candidate_labels)
        .await
    {
        Ok(prediction) => Ok(QueueReply {
            label: prediction.label,
            score: prediction.score,
            id,
        }),
        Err(error) if error.is_rejection() => Err(MessageFailure::Rejected { id, error }),
        Err(error) => Err(MessageFailure::Failed { id, error }),
    }
}
