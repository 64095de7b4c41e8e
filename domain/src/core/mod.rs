//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: a model backend identity tagged with its provider family
//! - [`question::Question`]: a validated multiple-choice question
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
pub mod string;
