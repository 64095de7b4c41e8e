//! Application-level configuration.
//!
//! - [`PipelineConfig`]: models, weights, threshold and concurrency
//! - [`TimeoutConfig`]: request, extraction and per-model time budgets

pub mod pipeline_config;

pub use pipeline_config::{PipelineConfig, TimeoutConfig};
