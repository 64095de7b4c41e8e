//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into a
//! [`PipelineConfig`] once validated.

mod models;
mod output;
mod providers;
mod settings;

pub use models::FileModelsConfig;
pub use output::FileOutputConfig;
pub use providers::{
    FileCerebrasConfig, FileGeminiConfig, FileOcrSpaceConfig, FileProvidersConfig,
};
pub use settings::{
    FileEnsembleConfig, FileGenerationConfig, FilePipelineConfig, FileTimeoutsConfig,
};

use mcq_application::PipelineConfig;
use mcq_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration that cannot be used, with every error-level issue found
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid configuration: {}", summary(.issues))]
pub struct ConfigValidationError {
    pub issues: Vec<ConfigIssue>,
}

fn summary(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model list, primary provider and weights
    pub models: FileModelsConfig,
    /// Vote settings
    pub ensemble: FileEnsembleConfig,
    pub timeouts: FileTimeoutsConfig,
    /// Sampling parameters
    pub generation: FileGenerationConfig,
    pub pipeline: FilePipelineConfig,
    /// API keys and endpoints
    pub providers: FileProvidersConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// This is the single entry point for config validation. It checks:
    /// 1. Model identifiers in every model field
    /// 2. Weights (positive and finite)
    /// 3. Threshold range
    /// 4. Timeouts (non-zero, ordered below the request deadline)
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Model parse validation
        issues.extend(self.models.parse_default().1);
        issues.extend(self.models.parse_structuring().1);

        // 2. Weights
        issues.extend(self.models.to_weight_table().1);

        // 3. Threshold
        issues.extend(self.ensemble.validate());

        // 4. Timeouts
        issues.extend(self.timeouts.validate());

        issues
    }

    /// Build the pipeline configuration.
    ///
    /// Fails when any error-level issue is present; warnings are left for
    /// the caller to report.
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig, ConfigValidationError> {
        let errors: Vec<ConfigIssue> = self
            .validate()
            .into_iter()
            .filter(ConfigIssue::is_error)
            .collect();
        if !errors.is_empty() {
            return Err(ConfigValidationError { issues: errors });
        }

        let mut config = PipelineConfig::default()
            .with_models(self.models.parse_default().0)
            .with_primary_provider(self.models.parse_primary_provider())
            .with_weights(self.models.to_weight_table().0)
            .with_threshold(self.ensemble.threshold)
            .with_timeouts(self.timeouts.to_timeout_config())
            .with_max_concurrent_questions(self.pipeline.max_concurrent_questions)
            .with_self_correction(self.pipeline.self_correction);
        config.structuring_model = self.models.parse_structuring().0;
        config.generation = self.generation.evaluation_params();
        config.structuring_generation = self.generation.structuring_params();

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcq_domain::{Model, OutputFormat, ProviderFamily};
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[models]
default = ["cerebras:llama-3.3-70b", "models/gemini-2.5-flash"]
primary_provider = "gemini"

[models.weights]
"cerebras:llama-3.3-70b" = 0.6
"models/gemini-2.5-flash" = 0.4

[ensemble]
threshold = 0.3

[timeouts]
request_secs = 90
extraction_secs = 30
model_secs = 20

[generation]
temperature = 0.0
max_tokens = 512

[pipeline]
max_concurrent_questions = 4
self_correction = false

[output]
format = "pretty"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());

        let pipeline = config.to_pipeline_config().unwrap();
        assert_eq!(pipeline.models.len(), 2);
        assert_eq!(pipeline.primary_provider, Some(ProviderFamily::Gemini));
        assert_eq!(pipeline.weights.weight(&Model::cerebras("llama-3.3-70b")), 0.6);
        assert_eq!(pipeline.threshold, 0.3);
        assert_eq!(pipeline.timeouts.request, Duration::from_secs(90));
        assert_eq!(pipeline.timeouts.model, Duration::from_secs(20));
        assert_eq!(pipeline.generation.max_tokens, 512);
        assert_eq!(pipeline.max_concurrent_questions, 4);
        assert!(!pipeline.self_correction);
        assert_eq!(config.output.format, Some(OutputFormat::Pretty));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[timeouts]
model_secs = 15
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let pipeline = config.to_pipeline_config().unwrap();
        // Defaults should apply
        assert_eq!(pipeline.models, Model::default_models());
        assert_eq!(pipeline.timeouts.model, Duration::from_secs(15));
        assert_eq!(pipeline.timeouts.request, Duration::from_secs(60));
        assert_eq!(pipeline.threshold, 0.25);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        let pipeline = config.to_pipeline_config().unwrap();
        assert_eq!(pipeline.primary_provider, Some(ProviderFamily::Cerebras));
        assert_eq!(pipeline.structuring_generation.temperature, 0.0);
    }

    #[test]
    fn test_errors_block_pipeline_config() {
        let toml_str = r#"
[ensemble]
threshold = 0.0

[timeouts]
request_secs = 0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let err = config.to_pipeline_config().unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(err.to_string().contains("ensemble.threshold"));
    }

    #[test]
    fn test_warnings_do_not_block() {
        let toml_str = r#"
[timeouts]
request_secs = 20
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.validate().len(), 1);
        assert!(config.to_pipeline_config().is_ok());
    }
}
