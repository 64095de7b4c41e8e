//! Ensemble, timeout, generation and pipeline settings from TOML
//! (`[ensemble]`, `[timeouts]`, `[generation]`, `[pipeline]` sections)

use mcq_application::{GenerationParams, TimeoutConfig};
use mcq_domain::{ConfigIssue, ConfigIssueCode, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEnsembleConfig {
    /// Quota threshold as a share of total weight, in `(0, 1]`
    pub threshold: f64,
}

impl Default for FileEnsembleConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl FileEnsembleConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        if self.threshold > 0.0 && self.threshold <= 1.0 {
            return Vec::new();
        }
        vec![ConfigIssue::error(
            ConfigIssueCode::ThresholdOutOfRange {
                value: self.threshold,
            },
            format!(
                "ensemble.threshold: {} is outside (0, 1]",
                self.threshold
            ),
        )]
    }
}

/// Time budgets in whole seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimeoutsConfig {
    pub request_secs: u64,
    pub extraction_secs: u64,
    pub model_secs: u64,
}

impl Default for FileTimeoutsConfig {
    fn default() -> Self {
        let defaults = TimeoutConfig::default();
        Self {
            request_secs: defaults.request.as_secs(),
            extraction_secs: defaults.extraction.as_secs(),
            model_secs: defaults.model.as_secs(),
        }
    }
}

impl FileTimeoutsConfig {
    pub fn to_timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig::default()
            .with_request(Duration::from_secs(self.request_secs))
            .with_extraction(Duration::from_secs(self.extraction_secs))
            .with_model(Duration::from_secs(self.model_secs))
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (field, value) in [
            ("request_secs", self.request_secs),
            ("extraction_secs", self.extraction_secs),
            ("model_secs", self.model_secs),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroTimeout {
                        field: field.to_string(),
                    },
                    format!("timeouts.{}: must be at least 1 second", field),
                ));
            }
        }

        if self.extraction_secs >= self.request_secs || self.model_secs >= self.request_secs {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::TimeoutOrdering,
                "timeouts: extraction_secs and model_secs should be shorter than request_secs, \
                 otherwise the request deadline fires first",
            ));
        }
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Token budget for the structuring step (OCR text can be long)
    pub structuring_max_tokens: u32,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            structuring_max_tokens: 2048,
        }
    }
}

impl FileGenerationConfig {
    pub fn evaluation_params(&self) -> GenerationParams {
        GenerationParams::new(self.temperature, self.max_tokens)
    }

    /// Structuring always runs at temperature 0
    pub fn structuring_params(&self) -> GenerationParams {
        GenerationParams::new(0.0, self.structuring_max_tokens)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Questions answered at the same time (1 = sequential)
    pub max_concurrent_questions: usize,
    /// Re-query the vision extractor once when options look malformed
    pub self_correction: bool,
}

impl Default for FilePipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_questions: 1,
            self_correction: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_range() {
        assert!(FileEnsembleConfig::default().validate().is_empty());
        assert!(FileEnsembleConfig { threshold: 1.0 }.validate().is_empty());
        assert_eq!(FileEnsembleConfig { threshold: 0.0 }.validate().len(), 1);
        assert_eq!(FileEnsembleConfig { threshold: 1.5 }.validate().len(), 1);
        assert_eq!(FileEnsembleConfig { threshold: f64::NAN }.validate().len(), 1);
    }

    #[test]
    fn test_default_timeouts_are_valid() {
        let timeouts = FileTimeoutsConfig::default();
        assert!(timeouts.validate().is_empty());
        assert_eq!(timeouts.to_timeout_config(), TimeoutConfig::default());
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let timeouts = FileTimeoutsConfig {
            model_secs: 0,
            ..Default::default()
        };
        let issues = timeouts.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }

    #[test]
    fn test_timeout_ordering_is_warning() {
        let timeouts = FileTimeoutsConfig {
            request_secs: 20,
            extraction_secs: 25,
            model_secs: 10,
        };
        let issues = timeouts.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::TimeoutOrdering);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_structuring_params_are_deterministic() {
        let generation = FileGenerationConfig {
            temperature: 0.7,
            ..Default::default()
        };
        assert_eq!(generation.structuring_params(), GenerationParams::new(0.0, 2048));
        assert_eq!(generation.evaluation_params().temperature, 0.7);
    }
}
