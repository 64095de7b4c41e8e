//! Builds the provider adapters from configuration.

use super::{CerebrasAdapter, GeminiAdapter, ProviderAdapter, RoutingGateway};
use crate::config::FileProvidersConfig;
use crate::ocr::OcrSpaceExtractor;
use async_trait::async_trait;
use mcq_application::ports::llm_gateway::{BackendReply, GatewayError, GenerationParams};
use mcq_application::ports::ocr::TextExtractor;
use mcq_application::ports::vision::VisionExtractor;
use mcq_domain::{Model, ProviderFamily};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Whether a provider has credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub name: &'static str,
    pub env_var: String,
    pub configured: bool,
}

/// Stand-in for a provider whose API key is missing.
///
/// Keeps models of that family routable so each call reports the missing
/// key instead of a generic "not available".
struct UnconfiguredAdapter {
    family: ProviderFamily,
    env_var: String,
}

#[async_trait]
impl ProviderAdapter for UnconfiguredAdapter {
    fn family(&self) -> ProviderFamily {
        self.family.clone()
    }

    async fn generate(
        &self,
        _model: &Model,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<BackendReply, GatewayError> {
        Err(GatewayError::MissingApiKey {
            provider: self.family.to_string(),
            env_var: self.env_var.clone(),
        })
    }
}

/// Everything the pipeline needs from the outside world
pub struct ProviderRegistry {
    pub gateway: Arc<RoutingGateway>,
    pub vision: Option<Arc<dyn VisionExtractor>>,
    pub ocr: Option<Arc<dyn TextExtractor>>,
    pub statuses: Vec<ProviderStatus>,
}

impl ProviderRegistry {
    /// Report which providers have an API key, without building clients
    pub fn health(config: &FileProvidersConfig) -> Vec<ProviderStatus> {
        vec![
            ProviderStatus {
                name: "cerebras",
                env_var: config.cerebras.api_key_env.clone(),
                configured: config.cerebras.resolve_api_key().is_some(),
            },
            ProviderStatus {
                name: "gemini",
                env_var: config.gemini.api_key_env.clone(),
                configured: config.gemini.resolve_api_key().is_some(),
            },
            ProviderStatus {
                name: "ocr_space",
                env_var: config.ocr_space.api_key_env.clone(),
                configured: config.ocr_space.resolve_api_key().is_some(),
            },
        ]
    }

    /// Build adapters for every configured provider.
    ///
    /// `http_timeout` bounds each HTTP request; pipeline deadlines are
    /// enforced separately by the use cases.
    pub fn from_config(
        config: &FileProvidersConfig,
        http_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
        let mut vision: Option<Arc<dyn VisionExtractor>> = None;
        let mut ocr: Option<Arc<dyn TextExtractor>> = None;

        match config.cerebras.resolve_api_key() {
            Some(key) => {
                let adapter = CerebrasAdapter::new(key, &config.cerebras.base_url, http_timeout)?;
                adapters.push(Arc::new(adapter));
            }
            None => {
                warn!(env_var = %config.cerebras.api_key_env, "Cerebras API key not set");
                adapters.push(Arc::new(UnconfiguredAdapter {
                    family: ProviderFamily::Cerebras,
                    env_var: config.cerebras.api_key_env.clone(),
                }));
            }
        }

        match config.gemini.resolve_api_key() {
            Some(key) => {
                let adapter = Arc::new(
                    GeminiAdapter::new(key, &config.gemini.base_url, http_timeout)?
                        .with_vision_model(Model::gemini(&config.gemini.vision_model)),
                );
                if config.gemini.vision {
                    let extractor: Arc<dyn VisionExtractor> = adapter.clone();
                    vision = Some(extractor);
                }
                adapters.push(adapter);
            }
            None => {
                warn!(env_var = %config.gemini.api_key_env, "Gemini API key not set; vision extraction disabled");
                adapters.push(Arc::new(UnconfiguredAdapter {
                    family: ProviderFamily::Gemini,
                    env_var: config.gemini.api_key_env.clone(),
                }));
            }
        }

        match config.ocr_space.resolve_api_key() {
            Some(key) => {
                let extractor =
                    OcrSpaceExtractor::new(key, &config.ocr_space.base_url, http_timeout)
                        .map_err(|e| GatewayError::Other(e.to_string()))?
                        .with_language(&config.ocr_space.language);
                ocr = Some(Arc::new(extractor));
            }
            None => debug!(env_var = %config.ocr_space.api_key_env, "OCR.space API key not set"),
        }

        Ok(Self {
            gateway: Arc::new(RoutingGateway::new(adapters)),
            vision,
            ocr,
            statuses: Self::health(config),
        })
    }
}
