//! Output formatter trait and the error payload

use mcq_application::SolveError;
use serde::Serialize;

/// Error body printed instead of a result: `{"error": code, "message": text}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

impl From<&SolveError> for ErrorPayload {
    fn from(err: &SolveError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

/// Trait for formatting solve results
pub trait OutputFormatter {
    /// Format a successful result
    fn format(&self, output: &mcq_application::SolveOutput) -> String;

    /// Format a failed request
    fn format_error(&self, error: &ErrorPayload) -> String;
}
