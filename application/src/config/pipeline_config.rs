//! Pipeline configuration: which models to ask, how to weigh them, and how
//! long each stage may take.
//!
//! [`PipelineConfig`] is built once at startup (usually from the file config
//! in the infrastructure layer) and is read-only afterwards.

use crate::ports::llm_gateway::GenerationParams;
use mcq_domain::{DEFAULT_THRESHOLD, Model, ProviderFamily, WeightTable};
use std::time::Duration;

/// Time budgets for each stage of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Whole request, extraction included
    pub request: Duration,
    /// Question extraction (vision, or OCR + structuring)
    pub extraction: Duration,
    /// One model call
    pub model: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(60),
            extraction: Duration::from_secs(25),
            model: Duration::from_secs(25),
        }
    }
}

impl TimeoutConfig {
    pub fn with_request(mut self, timeout: Duration) -> Self {
        self.request = timeout;
        self
    }

    pub fn with_extraction(mut self, timeout: Duration) -> Self {
        self.extraction = timeout;
        self
    }

    pub fn with_model(mut self, timeout: Duration) -> Self {
        self.model = timeout;
        self
    }
}

/// Everything a request needs besides its input
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Models consulted for every question, in configured order
    pub models: Vec<Model>,
    /// Provider family dispatched first
    pub primary_provider: Option<ProviderFamily>,
    /// Model that turns OCR text into questions
    pub structuring_model: Model,
    pub weights: WeightTable,
    /// Quota threshold for the ensemble vote
    pub threshold: f64,
    pub timeouts: TimeoutConfig,
    /// Sampling for answer evaluation
    pub generation: GenerationParams,
    /// Sampling for the structuring step
    pub structuring_generation: GenerationParams,
    /// Questions answered at the same time (1 = strictly sequential)
    pub max_concurrent_questions: usize,
    /// Re-query the vision extractor once when options look malformed
    pub self_correction: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: Model::default_models(),
            primary_provider: Some(ProviderFamily::Cerebras),
            structuring_model: Model::default_structuring_model(),
            weights: WeightTable::default(),
            threshold: DEFAULT_THRESHOLD,
            timeouts: TimeoutConfig::default(),
            generation: GenerationParams::default(),
            structuring_generation: GenerationParams::new(0.0, 2048),
            max_concurrent_questions: 1,
            self_correction: true,
        }
    }
}

impl PipelineConfig {
    // ==================== Builder Methods ====================

    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.models = models;
        self
    }

    pub fn with_primary_provider(mut self, family: Option<ProviderFamily>) -> Self {
        self.primary_provider = family;
        self
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_max_concurrent_questions(mut self, n: usize) -> Self {
        self.max_concurrent_questions = n.max(1);
        self
    }

    pub fn with_self_correction(mut self, enabled: bool) -> Self {
        self.self_correction = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.models.len(), 4);
        assert_eq!(config.primary_provider, Some(ProviderFamily::Cerebras));
        assert_eq!(config.threshold, 0.25);
        assert_eq!(config.max_concurrent_questions, 1);
        assert_eq!(config.timeouts.request, Duration::from_secs(60));
        assert!(config.timeouts.extraction < config.timeouts.request);
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::default()
            .with_models(vec![Model::gemini("gemini-2.5-flash")])
            .with_max_concurrent_questions(0)
            .with_timeouts(TimeoutConfig::default().with_model(Duration::from_secs(15)));
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.max_concurrent_questions, 1);
        assert_eq!(config.timeouts.model, Duration::from_secs(15));
    }
}
