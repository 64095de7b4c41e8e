//! Per-model trust weights

use crate::core::{error::DomainError, model::Model};
use serde::Serialize;
use std::collections::BTreeMap;

/// Weight used for models that are absent from the table
pub const DEFAULT_MODEL_WEIGHT: f64 = 0.15;

/// Immutable mapping from model id to a positive trust weight.
///
/// Built once from configuration and passed to the voter at call time.
///
/// # Example
///
/// ```
/// use mcq_domain::{Model, WeightTable};
///
/// let table = WeightTable::new(0.15)
///     .with_weight(&Model::cerebras("llama-3.3-70b"), 0.35)
///     .unwrap();
/// assert_eq!(table.weight(&Model::cerebras("llama-3.3-70b")), 0.35);
/// assert_eq!(table.weight(&Model::gemini("gemini-2.5-pro")), 0.15);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightTable {
    weights: BTreeMap<String, f64>,
    default_weight: f64,
}

impl WeightTable {
    /// An empty table where every model gets `default_weight`.
    ///
    /// Non-positive or non-finite defaults fall back to
    /// [`DEFAULT_MODEL_WEIGHT`].
    pub fn new(default_weight: f64) -> Self {
        let default_weight = if is_valid_weight(default_weight) {
            default_weight
        } else {
            DEFAULT_MODEL_WEIGHT
        };
        Self {
            weights: BTreeMap::new(),
            default_weight,
        }
    }

    /// Every model weighs the same
    pub fn uniform(weight: f64) -> Self {
        Self::new(weight)
    }

    /// Set the weight for one model
    pub fn with_weight(self, model: &Model, weight: f64) -> Result<Self, DomainError> {
        self.with_id_weight(model.id(), weight)
    }

    /// Set the weight for a model id as written in configuration
    pub fn with_id_weight(mut self, model_id: &str, weight: f64) -> Result<Self, DomainError> {
        if !is_valid_weight(weight) {
            return Err(DomainError::InvalidWeight {
                model: model_id.to_string(),
                weight,
            });
        }
        self.weights.insert(model_id.to_string(), weight);
        Ok(self)
    }

    /// Get the weight for a model, or the default when it is not listed
    pub fn weight(&self, model: &Model) -> f64 {
        self.weights
            .get(model.id())
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }

    /// Iterate over explicitly configured weights, ordered by model id
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(id, w)| (id.as_str(), *w))
    }
}

impl Default for WeightTable {
    /// Weights tuned for [`Model::default_models`]
    fn default() -> Self {
        let mut table = Self::new(DEFAULT_MODEL_WEIGHT);
        for (id, weight) in [
            ("cerebras:qwen-3-235b-a22b-thinking-2507", 0.3),
            ("cerebras:llama-3.3-70b", 0.35),
            ("cerebras:qwen-3-32b", 0.15),
            ("models/gemini-2.5-flash", 0.2),
        ] {
            table.weights.insert(id.to_string(), weight);
        }
        table
    }
}

fn is_valid_weight(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_covers_default_models() {
        let table = WeightTable::default();
        let total: f64 = Model::default_models().iter().map(|m| table.weight(m)).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(table.weight(&Model::cerebras("llama-3.3-70b")), 0.35);
    }

    #[test]
    fn test_absent_model_uses_default() {
        let table = WeightTable::default();
        assert_eq!(table.weight(&Model::custom("groq", "mixtral")), DEFAULT_MODEL_WEIGHT);
    }

    #[test]
    fn test_rejects_non_positive_weight() {
        let model = Model::cerebras("qwen-3-32b");
        assert!(WeightTable::new(0.15).with_weight(&model, 0.0).is_err());
        assert!(WeightTable::new(0.15).with_weight(&model, -1.0).is_err());
        assert!(WeightTable::new(0.15).with_weight(&model, f64::NAN).is_err());
    }

    #[test]
    fn test_invalid_default_falls_back() {
        assert_eq!(WeightTable::new(0.0).default_weight(), DEFAULT_MODEL_WEIGHT);
        assert_eq!(WeightTable::uniform(1.0).default_weight(), 1.0);
    }
}
