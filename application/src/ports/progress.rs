//! Progress notification port
//!
//! Defines the interface for reporting progress while a request runs.

use crate::use_cases::extract_questions::ExtractionPath;
use mcq_domain::{EnsembleResult, Model, Question};

/// Callback for progress updates during a request
///
/// Implementations live in the presentation layer. Every method has a no-op
/// default so implementors only override what they display.
pub trait ProgressNotifier: Send + Sync {
    /// Called before questions are extracted from the input
    fn on_extraction_start(&self) {}

    /// Called once questions are available
    fn on_extraction_complete(&self, _path: ExtractionPath, _question_count: usize) {}

    /// Called when a question is dispatched to the models
    fn on_question_start(&self, _question: &Question, _index: usize, _total: usize) {}

    /// Called when one model finishes with a question
    fn on_model_complete(&self, _question_id: &str, _model: &Model, _success: bool) {}

    /// Called when a question's ensemble decision is made
    fn on_question_complete(&self, _result: &EnsembleResult) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {}
