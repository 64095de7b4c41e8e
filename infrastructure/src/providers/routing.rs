use super::ProviderAdapter;
use async_trait::async_trait;
use mcq_application::ports::llm_gateway::{
    BackendReply, GatewayError, GenerationParams, LlmGateway,
};
use mcq_domain::{Model, ProviderFamily};
use std::sync::Arc;
use tracing::trace;

/// Gateway that forwards each call to the adapter of the model's provider
pub struct RoutingGateway {
    providers: Vec<Arc<dyn ProviderAdapter>>,
}

impl RoutingGateway {
    pub fn new(providers: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { providers }
    }

    /// Provider families with a registered adapter, in registration order
    pub fn families(&self) -> Vec<ProviderFamily> {
        self.providers.iter().map(|p| p.family()).collect()
    }

    /// Find the adapter for a model.
    ///
    /// The first adapter registered for the model's family wins. There is no
    /// fallback to another family: a Gemini model must never silently run
    /// on Cerebras, since weights are keyed by model.
    fn resolve_provider(&self, model: &Model) -> Result<&dyn ProviderAdapter, GatewayError> {
        self.providers
            .iter()
            .find(|p| model.is_from(&p.family()))
            .map(|p| p.as_ref())
            .ok_or_else(|| {
                GatewayError::ModelNotAvailable(format!(
                    "{} (no adapter for provider '{}')",
                    model,
                    model.provider()
                ))
            })
    }
}

#[async_trait]
impl LlmGateway for RoutingGateway {
    async fn invoke(
        &self,
        model: &Model,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BackendReply, GatewayError> {
        let provider = self.resolve_provider(model)?;
        trace!(model = %model, provider = %provider.family(), "Routing model call");
        provider.generate(model, prompt, params).await
    }
}
