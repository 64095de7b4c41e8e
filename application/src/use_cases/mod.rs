//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch;
pub mod extract_questions;
pub mod solve_mcqs;
