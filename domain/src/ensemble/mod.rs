//! Ensemble decision over several models' answers
//!
//! # Flow
//!
//! ```text
//! ModelOutcome ──► LabelNormalizer ──► score[label] += weight(model)
//!      (× n)          (per question)            │
//!                                               ▼
//!                       score >= threshold × total weight ?
//!                          │ yes                 │ none
//!                          ▼                     ▼
//!                    quota winners         top scorer (ties: option order)
//! ```
//!
//! Failed and unparsed outcomes add no weight; they only appear in the
//! audit trail ([`outcome::ModelVerdict`]).

pub mod labels;
pub mod outcome;
pub mod voter;
pub mod weights;

pub use labels::LabelNormalizer;
pub use outcome::{ModelOutcome, ModelVerdict, TIMEOUT_ERROR_KIND};
pub use voter::{DEFAULT_THRESHOLD, Decision, EnsembleResult, EnsembleVoter, vote};
pub use weights::{DEFAULT_MODEL_WEIGHT, WeightTable};
