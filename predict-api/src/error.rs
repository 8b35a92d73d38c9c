//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use classifier_core::ClassifierError;
use serde::Serialize;
use tracing::error;

/// An HTTP error rendered as `{"code", "name", "description"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub description: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: u16,
    name: &'a str,
    description: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
        }
    }

    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, description)
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        let status = match &err {
            ClassifierError::SchemaViolation(_) => StatusCode::BAD_REQUEST,
            ClassifierError::TooManyLabels { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ClassifierError::InvalidArgument(_) | ClassifierError::ClassificationFailure(_) => {
                error!(error = ?err, "Request failed inside the classifier");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.status.as_u16(),
            name: self.status.canonical_reason().unwrap_or("Unknown Error"),
            description: &self.description,
        };
        (self.status, Json(body)).into_response()
    }
}
