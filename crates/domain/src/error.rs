//! Unified error types for the domain layer
//!
//! Every domain constructor reports failures through `DomainError`, so the
//! HTTP boundary can map them to validation responses without string matching.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Identifier is not part of a closed vocabulary
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Narrative shorter than the accepted minimum
    #[error("Story text must be at least {min} characters (got {actual})")]
    NarrativeTooShort { min: usize, actual: usize },

    /// Narrative longer than the accepted maximum
    #[error("Story text exceeds maximum length of {max} characters (got {actual})")]
    NarrativeTooLong { max: usize, actual: usize },
}

impl DomainError {
    /// Creates a validation error for rejected input.
    ///
    /// # Example
    /// ```ignore
    /// if emotions.is_empty() {
    ///     return Err(DomainError::validation("At least one emotion must be selected"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }
}
