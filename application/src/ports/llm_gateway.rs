//! LLM Gateway port
//!
//! Defines the interface for calling a model backend with a prompt.

use async_trait::async_trait;
use mcq_domain::Model;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during a backend call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Missing API key for {provider} (set {env_var})")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Sampling parameters for one call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 1024,
        }
    }
}

impl GenerationParams {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

/// Unparsed backend output
#[derive(Debug, Clone)]
pub struct BackendReply {
    pub model: Model,
    pub text: String,
    /// Provider-specific diagnostics (usage, finish reason, ...)
    pub raw_metadata: serde_json::Value,
}

impl BackendReply {
    pub fn new(model: Model, text: impl Into<String>) -> Self {
        Self {
            model,
            text: text.into(),
            raw_metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, raw_metadata: serde_json::Value) -> Self {
        self.raw_metadata = raw_metadata;
        self
    }
}

/// Gateway for model backend calls
///
/// This port defines how the application layer talks to model providers.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send one prompt to a model and return its raw reply
    async fn invoke(
        &self,
        model: &Model,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BackendReply, GatewayError>;
}
