//! Model provider adapters
//!
//! Each adapter speaks one provider's HTTP API. [`RoutingGateway`] picks the
//! adapter registered for a model's [`ProviderFamily`] and exposes the set
//! as a single [`LlmGateway`](mcq_application::LlmGateway).

pub mod cerebras;
pub mod gemini;
pub mod registry;
pub mod routing;

pub use cerebras::CerebrasAdapter;
pub use gemini::GeminiAdapter;
pub use registry::{ProviderRegistry, ProviderStatus};
pub use routing::RoutingGateway;

use async_trait::async_trait;
use mcq_application::ports::llm_gateway::{BackendReply, GatewayError, GenerationParams};
use mcq_domain::{Model, ProviderFamily};

/// Maximum number of characters of an error body kept in messages
const MAX_ERROR_BODY: usize = 300;

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn family(&self) -> ProviderFamily;

    async fn generate(
        &self,
        model: &Model,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BackendReply, GatewayError>;
}

/// Resolve an API key from an explicit value or an environment variable.
///
/// Blank values count as missing.
pub fn resolve_api_key(explicit: Option<&str>, env_var: &str) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|key| !key.trim().is_empty())
}

pub(crate) fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::RequestFailed(err.to_string())
    }
}

/// Shorten a provider error body for logs and error messages
pub(crate) fn clip_body(body: &str) -> String {
    mcq_domain::core::string::preview(body.trim(), MAX_ERROR_BODY)
}

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Other(format!("Failed to create HTTP client: {e}")))
}
