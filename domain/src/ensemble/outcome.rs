//! Per-model outcomes of one dispatched question

use crate::core::model::Model;
use crate::parsing::answer::ParsedAnswer;
use serde::Serialize;

/// Error kind recorded when a model call exceeds its time budget
pub const TIMEOUT_ERROR_KIND: &str = "timeout";

/// What happened when one model was asked one question.
///
/// Exactly one variant holds per dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutcome {
    /// The model replied and an answer could be parsed
    Success {
        model: Model,
        answer: ParsedAnswer,
        raw_text: String,
    },
    /// The model replied but no answer could be recovered
    ParseFailure { model: Model, raw_text: String },
    /// The call itself failed (transport, provider error or timeout)
    CallFailure { model: Model, error_kind: String },
}

impl ModelOutcome {
    pub fn success(model: Model, answer: ParsedAnswer, raw_text: impl Into<String>) -> Self {
        ModelOutcome::Success {
            model,
            answer,
            raw_text: raw_text.into(),
        }
    }

    pub fn parse_failure(model: Model, raw_text: impl Into<String>) -> Self {
        ModelOutcome::ParseFailure {
            model,
            raw_text: raw_text.into(),
        }
    }

    pub fn call_failure(model: Model, error_kind: impl Into<String>) -> Self {
        ModelOutcome::CallFailure {
            model,
            error_kind: error_kind.into(),
        }
    }

    pub fn timeout(model: Model) -> Self {
        Self::call_failure(model, TIMEOUT_ERROR_KIND)
    }

    pub fn model(&self) -> &Model {
        match self {
            ModelOutcome::Success { model, .. }
            | ModelOutcome::ParseFailure { model, .. }
            | ModelOutcome::CallFailure { model, .. } => model,
        }
    }

    /// The parsed answer, for successful outcomes
    pub fn answer(&self) -> Option<&ParsedAnswer> {
        match self {
            ModelOutcome::Success { answer, .. } => Some(answer),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ModelOutcome::Success { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ModelOutcome::CallFailure { error_kind, .. } if error_kind == TIMEOUT_ERROR_KIND)
    }
}

/// Audit record of one model's contribution to an ensemble decision
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelVerdict {
    Answered {
        model: Model,
        weight: f64,
        /// Labels as the model wrote them
        raw_labels: Vec<String>,
        /// Labels that resolved to one of the question's options
        counted_labels: Vec<String>,
        confidence: f64,
        reasoning: String,
    },
    Unparsed {
        model: Model,
        raw_text: String,
    },
    Failed {
        model: Model,
        error: String,
    },
}

impl ModelVerdict {
    pub fn model(&self) -> &Model {
        match self {
            ModelVerdict::Answered { model, .. }
            | ModelVerdict::Unparsed { model, .. }
            | ModelVerdict::Failed { model, .. } => model,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, ModelVerdict::Answered { .. })
    }
}
