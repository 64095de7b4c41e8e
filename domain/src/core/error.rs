//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// These are data errors: a malformed question or model identity is rejected
/// at construction time, before anything is dispatched to a backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Question {0} has no options")]
    NoOptions(String),

    #[error("Question {question_id} has duplicate option label '{label}'")]
    DuplicateLabel { question_id: String, label: String },

    #[error("Question {0} has an empty option label")]
    EmptyLabel(String),

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid weight {weight} for model {model}: weights must be positive")]
    InvalidWeight { model: String, weight: f64 },
}

impl DomainError {
    /// Check if this error describes malformed question data
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::NoOptions(_)
                | DomainError::DuplicateLabel { .. }
                | DomainError::EmptyLabel(_)
                | DomainError::InvalidQuestion(_)
        )
    }
}
