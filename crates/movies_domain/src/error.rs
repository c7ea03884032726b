//! Domain error type.
//!
//! Every value-object constructor and every aggregate mutator returns this
//! error on invariant violation; callers always get the object back
//! unchanged rather than left half-updated.

use thiserror::Error;

/// A domain invariant was violated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// The field that failed validation (used by the tool-response shaping
    /// layer to build `data.errors[]`).
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}
