//! Configuration issues detected while validating settings.
//!
//! Validation never stops at the first problem: every issue is collected
//! with a severity so callers can print warnings and refuse to start only
//! on errors.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssueCode {
    /// A model name in a model list or field is empty.
    EmptyModelName { field: String },
    /// A model identifier has no provider prefix.
    InvalidModel { field: String, value: String },
    /// A weight is zero, negative or not finite.
    NonPositiveWeight { model: String, weight: f64 },
    /// The ensemble threshold is outside `(0, 1]`.
    ThresholdOutOfRange { value: f64 },
    /// A timeout is zero.
    ZeroTimeout { field: String },
    /// Timeouts are not ordered extraction < request and model < request.
    TimeoutOrdering,
    /// The default model list is empty.
    NoModels,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
