//! Model selection and weights from TOML (`[models]` section)

use mcq_domain::{
    ConfigIssue, ConfigIssueCode, DEFAULT_MODEL_WEIGHT, Model, ProviderFamily, WeightTable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model configuration from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// default = ["cerebras:llama-3.3-70b", "models/gemini-2.5-flash"]
/// primary_provider = "cerebras"
/// structuring = "cerebras:llama-3.3-70b"
/// default_weight = 0.15
///
/// [models.weights]
/// "cerebras:llama-3.3-70b" = 0.35
/// "models/gemini-2.5-flash" = 0.2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Models consulted for every question (built-in list when absent)
    pub default: Option<Vec<String>>,
    /// Provider family dispatched first; empty string disables ordering
    pub primary_provider: Option<String>,
    /// Model that structures OCR text into questions
    pub structuring: Option<String>,
    /// Per-model vote weights, keyed by model id
    pub weights: BTreeMap<String, f64>,
    /// Weight for models missing from `weights`
    pub default_weight: f64,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        let table = WeightTable::default();
        Self {
            default: None,
            primary_provider: Some(ProviderFamily::Cerebras.to_string()),
            structuring: None,
            weights: table.iter().map(|(id, w)| (id.to_string(), w)).collect(),
            default_weight: DEFAULT_MODEL_WEIGHT,
        }
    }
}

impl FileModelsConfig {
    fn parse_model(field: &str, value: &str, issues: &mut Vec<ConfigIssue>) -> Option<Model> {
        if value.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModelName {
                    field: field.to_string(),
                },
                format!("models.{}: model name cannot be empty", field),
            ));
            return None;
        }
        match value.parse::<Model>() {
            Ok(model) => Some(model),
            Err(e) => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidModel {
                        field: field.to_string(),
                        value: value.to_string(),
                    },
                    format!("models.{}: {}", field, e),
                ));
                None
            }
        }
    }

    /// Parse the default model list, collecting issues for bad entries.
    ///
    /// Returns the built-in list when none is configured.
    pub fn parse_default(&self) -> (Vec<Model>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let Some(values) = &self.default else {
            return (Model::default_models(), issues);
        };

        let models: Vec<Model> = values
            .iter()
            .filter_map(|s| Self::parse_model("default", s, &mut issues))
            .collect();

        if values.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoModels,
                "models.default: at least one model is required",
            ));
        }
        (models, issues)
    }

    /// Parse the structuring model, falling back to the built-in one
    pub fn parse_structuring(&self) -> (Model, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let model = self
            .structuring
            .as_deref()
            .and_then(|s| Self::parse_model("structuring", s, &mut issues))
            .unwrap_or_else(Model::default_structuring_model);
        (model, issues)
    }

    pub fn parse_primary_provider(&self) -> Option<ProviderFamily> {
        self.primary_provider
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
    }

    /// Build the weight table, skipping (and reporting) non-positive weights
    pub fn to_weight_table(&self) -> (WeightTable, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        if !(self.default_weight.is_finite() && self.default_weight > 0.0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NonPositiveWeight {
                    model: "default_weight".to_string(),
                    weight: self.default_weight,
                },
                format!(
                    "models.default_weight: {} is not a positive number",
                    self.default_weight
                ),
            ));
        }

        let mut table = WeightTable::new(self.default_weight);
        for (id, &weight) in &self.weights {
            let canonical = id
                .parse::<Model>()
                .map(|m| m.id().to_string())
                .unwrap_or_else(|_| id.clone());
            match table.clone().with_id_weight(&canonical, weight) {
                Ok(updated) => table = updated,
                Err(e) => issues.push(ConfigIssue::error(
                    ConfigIssueCode::NonPositiveWeight {
                        model: id.clone(),
                        weight,
                    },
                    format!("models.weights: {}", e),
                )),
            }
        }
        (table, issues)
    }
}
