//! Request validation shared by every transport.
//!
//! Two stages run in order:
//! - Structural: the payload is an object with a non-empty `text` string and
//!   a `candidate_labels` array of at least one string. Unknown fields are
//!   ignored.
//! - Semantic: no more than [`MAX_CANDIDATE_LABELS`] labels, since each label
//!   costs one forward pass through the model.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ClassifierError;
use crate::request::PredictionRequest;

/// Maximum number of candidate labels accepted per request
pub const MAX_CANDIDATE_LABELS: usize = 5;

/// The front-end a request arrived through. Only used to word rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// HTTP endpoint
    Api,
    /// Message-queue worker
    Service,
    /// Batch CSV runner
    Classifier,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Api => "API",
            Self::Service => "service",
            Self::Classifier => "classifier",
        };
        f.write_str(name)
    }
}

#[derive(Deserialize)]
struct RawRequest {
    text: String,
    candidate_labels: Vec<String>,
}

/// Validates loosely-typed payloads into [`PredictionRequest`]s.
#[derive(Debug, Clone, Copy)]
pub struct RequestValidator {
    surface: Surface,
    max_labels: usize,
}

impl RequestValidator {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            max_labels: MAX_CANDIDATE_LABELS,
        }
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Run the structural check, then the semantic check.
    ///
    /// The returned request never carries an `id`; transports that use one
    /// extract it themselves before validating.
    pub fn parse(&self, value: Value) -> Result<PredictionRequest, ClassifierError> {
        if !value.is_object() {
            return Err(ClassifierError::schema(
                "Invalid request: expected a JSON object",
            ));
        }

        let raw: RawRequest = serde_json::from_value(value)
            .map_err(|e| ClassifierError::schema(format!("Invalid request: {e}")))?;

        if raw.text.is_empty() {
            return Err(ClassifierError::schema(
                "Invalid request: 'text' must be a non-empty string",
            ));
        }
        if raw.candidate_labels.is_empty() {
            return Err(ClassifierError::schema(
                "Invalid request: 'candidate_labels' must contain at least 1 item",
            ));
        }

        let request = PredictionRequest::new(raw.text, raw.candidate_labels);
        self.check(&request)?;
        Ok(request)
    }

    /// Enforce the label-count cap on an already well-formed request.
    pub fn check(&self, request: &PredictionRequest) -> Result<(), ClassifierError> {
        let count = request.candidate_labels.len();
        if count > self.max_labels {
            return Err(ClassifierError::TooManyLabels {
                surface: self.surface,
                max: self.max_labels,
                count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("label-{i}")).collect()
    }

    #[test]
    fn test_parse_valid_request() {
        let validator = RequestValidator::new(Surface::Api);
        let request = validator
            .parse(json!({ "text": "This is great!", "candidate_labels": ["sad", "happy"] }))
            .unwrap();

        assert_eq!(request.text, "This is great!");
        assert_eq!(request.candidate_labels, vec!["sad", "happy"]);
        assert!(request.id.is_none());
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let validator = RequestValidator::new(Surface::Service);
        let request = validator
            .parse(json!({ "text": "hi", "candidate_labels": ["a"], "id": "abc", "extra": 1 }))
            .unwrap();
        assert_eq!(request.candidate_labels.len(), 1);
    }

    #[test]
    fn test_missing_text_is_schema_violation() {
        let validator = RequestValidator::new(Surface::Api);
        let err = validator
            .parse(json!({ "candidate_labels": ["a"] }))
            .unwrap_err();

        assert!(matches!(err, ClassifierError::SchemaViolation(_)));
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn test_wrong_types_are_schema_violations() {
        let validator = RequestValidator::new(Surface::Api);
        for payload in [
            json!({ "text": 42, "candidate_labels": ["a"] }),
            json!({ "text": "hi", "candidate_labels": "a" }),
            json!({ "text": "hi", "candidate_labels": [1, 2] }),
            json!(["text", "candidate_labels"]),
            json!(null),
        ] {
            let err = validator.parse(payload).unwrap_err();
            assert!(matches!(err, ClassifierError::SchemaViolation(_)), "{err:?}");
        }
    }

    #[test]
    fn test_empty_labels_and_text_rejected() {
        let validator = RequestValidator::new(Surface::Api);

        let err = validator
            .parse(json!({ "text": "hi", "candidate_labels": [] }))
            .unwrap_err();
        assert!(err.to_string().contains("at least 1"));

        let err = validator
            .parse(json!({ "text": "", "candidate_labels": ["a"] }))
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_label_cap_boundary() {
        let validator = RequestValidator::new(Surface::Api);

        let five = PredictionRequest::new("hi", labels(5));
        assert!(validator.check(&five).is_ok());

        let six = PredictionRequest::new("hi", labels(6));
        let err = validator.check(&six).unwrap_err();
        assert_eq!(
            err,
            ClassifierError::TooManyLabels {
                surface: Surface::Api,
                max: 5,
                count: 6
            }
        );
    }

    #[test]
    fn test_parse_applies_label_cap() {
        let validator = RequestValidator::new(Surface::Classifier);
        let err = validator
            .parse(json!({ "text": "hi", "candidate_labels": labels(7) }))
            .unwrap_err();
        assert_eq!(err.to_string(), "This classifier allows for up to 5 classes.");
    }

    #[test]
    fn test_duplicate_labels_allowed() {
        let validator = RequestValidator::new(Surface::Api);
        let request = validator
            .parse(json!({ "text": "hi", "candidate_labels": ["a", "a"] }))
            .unwrap();
        assert_eq!(request.candidate_labels, vec!["a", "a"]);
    }
}
