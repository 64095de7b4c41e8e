//! Domain layer for mcq-quorum
//!
//! This crate contains the pure decision logic of the system. It has no
//! dependencies on I/O, providers or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Questions
//!
//! A [`Question`] is an immutable multiple-choice item with ordered options.
//! Option labels are the canonical identity used in scoring and output.
//!
//! ## Answer parsing
//!
//! Model replies are free text. [`parse_answer`] turns them into a
//! [`ParsedAnswer`] through an ordered chain of JSON repair strategies.
//!
//! ## Ensemble
//!
//! Per-model outcomes are reconciled by [`EnsembleVoter`] using a
//! [`WeightTable`] and a quota threshold, falling back to the top scorer
//! when no option clears the quota.

pub mod config;
pub mod core;
pub mod ensemble;
pub mod parsing;
pub mod prompt;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    error::DomainError,
    model::{Model, ProviderFamily},
    question::{Question, QuestionOption},
};
pub use ensemble::{
    labels::LabelNormalizer,
    outcome::{ModelOutcome, ModelVerdict, TIMEOUT_ERROR_KIND},
    voter::{DEFAULT_THRESHOLD, Decision, EnsembleResult, EnsembleVoter, vote},
    weights::{DEFAULT_MODEL_WEIGHT, WeightTable},
};
pub use parsing::{
    answer::{ParsedAnswer, parse_answer},
    questions::{QuestionParseError, parse_question_array, questions_from_value},
    repair::{JsonShape, repair_json},
};
pub use prompt::PromptTemplate;
