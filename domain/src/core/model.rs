//! Model value object representing a backend + model pair

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Provider family a model belongs to.
///
/// The family is an explicit tag assigned when a model is configured. It is
/// used to route calls to the right adapter and to put the primary provider
/// first when dispatching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderFamily {
    Cerebras,
    Gemini,
    Custom(String),
}

impl ProviderFamily {
    pub fn as_str(&self) -> &str {
        match self {
            ProviderFamily::Cerebras => "cerebras",
            ProviderFamily::Gemini => "gemini",
            ProviderFamily::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderFamily {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "cerebras" => ProviderFamily::Cerebras,
            "gemini" | "google" => ProviderFamily::Gemini,
            other => ProviderFamily::Custom(other.to_string()),
        })
    }
}

impl Serialize for ProviderFamily {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderFamily {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.parse() {
            Ok(family) => Ok(family),
            Err(never) => match never {},
        }
    }
}

/// A model backend identity (Value Object)
///
/// `id` is the configuration-facing identifier and the weight-table key
/// (e.g. `cerebras:llama-3.3-70b`, `models/gemini-2.5-flash`). `name` is the
/// identifier the provider API expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Model {
    id: String,
    name: String,
    provider: ProviderFamily,
}

impl Model {
    /// A Cerebras-hosted model, identified as `cerebras:<name>`
    pub fn cerebras(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("cerebras:{}", name),
            name,
            provider: ProviderFamily::Cerebras,
        }
    }

    /// A Gemini model, identified as `models/<name>`
    pub fn gemini(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("models/{}", name),
            name,
            provider: ProviderFamily::Gemini,
        }
    }

    /// A model from any other provider, identified as `<provider>:<name>`.
    ///
    /// Known provider names (`cerebras`, `gemini`, `google`) resolve to
    /// their family, so this builds the same model as parsing the id.
    pub fn custom(provider: impl Into<String>, name: impl Into<String>) -> Self {
        let provider: String = provider.into();
        let name = name.into();
        match provider.parse::<ProviderFamily>() {
            Ok(ProviderFamily::Cerebras) => Model::cerebras(name),
            Ok(ProviderFamily::Gemini) => Model::gemini(name),
            Ok(ProviderFamily::Custom(family)) => Self {
                id: format!("{}:{}", family, name),
                name,
                provider: ProviderFamily::Custom(family),
            },
            Err(never) => match never {},
        }
    }

    /// Get the identifier used in configuration and weight tables
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the model name the provider API expects
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &ProviderFamily {
        &self.provider
    }

    /// Check if this model belongs to the given provider family
    pub fn is_from(&self, family: &ProviderFamily) -> bool {
        &self.provider == family
    }

    /// Get the default set of models consulted for every question
    pub fn default_models() -> Vec<Model> {
        vec![
            Model::cerebras("qwen-3-235b-a22b-thinking-2507"),
            Model::cerebras("llama-3.3-70b"),
            Model::cerebras("qwen-3-32b"),
            Model::gemini("gemini-2.5-flash"),
        ]
    }

    /// Get the default model used to structure OCR text into questions
    pub fn default_structuring_model() -> Model {
        Model::cerebras("llama-3.3-70b")
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl std::str::FromStr for Model {
    type Err = DomainError;

    /// Parse `provider:name` or the Gemini resource form `models/name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix("models/") {
            if name.is_empty() {
                return Err(DomainError::InvalidModel(s.to_string()));
            }
            return Ok(Model::gemini(name));
        }

        let Some((provider, name)) = s.split_once(':') else {
            return Err(DomainError::InvalidModel(format!(
                "'{}' has no provider prefix (expected provider:name or models/name)",
                s
            )));
        };
        if provider.trim().is_empty() || name.trim().is_empty() {
            return Err(DomainError::InvalidModel(s.to_string()));
        }

        Ok(Model::custom(provider, name))
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.id)
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
