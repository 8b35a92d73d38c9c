//! Error taxonomy shared by all front-ends.

use thiserror::Error;

use crate::validate::Surface;

/// Errors that can occur while validating or classifying a request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Request is missing required fields or has the wrong types.
    #[error("{0}")]
    SchemaViolation(String),

    /// More candidate labels than the per-request cap allows.
    #[error("This {surface} allows for up to {max} classes.")]
    TooManyLabels {
        surface: Surface,
        max: usize,
        count: usize,
    },

    /// Caller broke the gateway contract (e.g. classify with no labels).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Model load or inference failed.
    #[error("Classification failed: {0}")]
    ClassificationFailure(String),
}

impl ClassifierError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaViolation(message.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::ClassificationFailure(message.into())
    }

    /// True for failures caused by the caller's input rather than the model.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::SchemaViolation(_) | Self::TooManyLabels { .. })
    }
}
