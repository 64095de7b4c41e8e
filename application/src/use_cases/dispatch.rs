//! Model dispatch
//!
//! Sends one question to every configured model at once and turns each
//! reply (or failure) into a [`ModelOutcome`].

use crate::ports::llm_gateway::{GatewayError, GenerationParams, LlmGateway};
use crate::ports::progress::ProgressNotifier;
use mcq_domain::core::string::preview;
use mcq_domain::{Model, ModelOutcome, PromptTemplate, ProviderFamily, Question, parse_answer};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Error kind recorded when a backend returns no text
pub const EMPTY_RESPONSE_ERROR_KIND: &str = "empty_response";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No models configured")]
    NoModels,
}

/// Put models of the primary provider first, keeping relative order
pub fn order_models(models: &[Model], primary: Option<&ProviderFamily>) -> Vec<Model> {
    let Some(primary) = primary else {
        return models.to_vec();
    };
    let (mut first, rest): (Vec<Model>, Vec<Model>) =
        models.iter().cloned().partition(|m| m.is_from(primary));
    first.extend(rest);
    first
}

/// Queries several models for one question under a per-call timeout
pub struct ModelDispatcher<G: LlmGateway + ?Sized> {
    gateway: Arc<G>,
    primary: Option<ProviderFamily>,
    model_timeout: Duration,
    params: GenerationParams,
}

impl<G: LlmGateway + ?Sized> ModelDispatcher<G> {
    pub fn new(gateway: Arc<G>, model_timeout: Duration) -> Self {
        Self {
            gateway,
            primary: None,
            model_timeout,
            params: GenerationParams::default(),
        }
    }

    pub fn with_primary(mut self, primary: Option<ProviderFamily>) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Ask every model about `question`.
    ///
    /// Returns one outcome per model in dispatch order (primary provider
    /// first). A model that fails or times out never affects the others.
    pub async fn dispatch(
        &self,
        question: &Question,
        models: &[Model],
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<ModelOutcome>, DispatchError> {
        if models.is_empty() {
            return Err(DispatchError::NoModels);
        }

        let ordered = order_models(models, self.primary.as_ref());
        let prompt = PromptTemplate::evaluation_prompt(question);

        let calls = ordered.into_iter().map(|model| {
            let prompt = prompt.as_str();
            async move {
                let outcome = self.call_model(model, prompt).await;
                progress.on_model_complete(question.id(), outcome.model(), outcome.is_success());
                outcome
            }
        });

        Ok(futures::future::join_all(calls).await)
    }

    async fn call_model(&self, model: Model, prompt: &str) -> ModelOutcome {
        let result = timeout(
            self.model_timeout,
            self.gateway.invoke(&model, prompt, &self.params),
        )
        .await;

        match result {
            Err(_) | Ok(Err(GatewayError::Timeout)) => {
                warn!(model = %model, timeout = ?self.model_timeout, "Model call timed out");
                ModelOutcome::timeout(model)
            }
            Ok(Err(e)) => {
                warn!(model = %model, error = %e, "Model call failed");
                ModelOutcome::call_failure(model, e.to_string())
            }
            Ok(Ok(reply)) if reply.text.trim().is_empty() => {
                warn!(model = %model, "Model returned an empty response");
                ModelOutcome::call_failure(model, EMPTY_RESPONSE_ERROR_KIND)
            }
            Ok(Ok(reply)) => match parse_answer(&reply.text) {
                Some(answer) => {
                    debug!(
                        model = %model,
                        selected = ?answer.selected_options,
                        confidence = answer.confidence,
                        "Model answered"
                    );
                    ModelOutcome::success(model, answer, reply.text)
                }
                None => {
                    warn!(
                        model = %model,
                        reply = %preview(&reply.text, 120),
                        "Could not parse model reply"
                    );
                    ModelOutcome::parse_failure(model, reply.text)
                }
            },
        }
    }
}
