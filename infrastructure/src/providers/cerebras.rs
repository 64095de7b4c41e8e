//! Cerebras adapter (OpenAI-compatible chat completions).

use super::{ProviderAdapter, clip_body, http_client, transport_error};
use async_trait::async_trait;
use mcq_application::ports::llm_gateway::{BackendReply, GatewayError, GenerationParams};
use mcq_domain::{Model, PromptTemplate, ProviderFamily};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai/v1";
pub const API_KEY_ENV: &str = "CEREBRAS_API_KEY";

/// Chat-completions client for Cerebras-hosted models
#[derive(Debug, Clone)]
pub struct CerebrasAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CerebrasAdapter {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    max_completion_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    text: Option<String>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Turn a raw HTTP response into a reply.
///
/// A successful response without any choice content yields an empty reply;
/// the dispatcher records that as `empty_response`.
fn parse_response(model: &Model, status: StatusCode, body: &str) -> Result<BackendReply, GatewayError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.error.and_then(|b| b.message).or(e.message))
            .unwrap_or_else(|| clip_body(body));
        return Err(GatewayError::HttpStatus {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("cerebras: {e}")))?;

    let choice = parsed.choices.into_iter().next();
    let finish_reason = choice.as_ref().and_then(|c| c.finish_reason.clone());
    let text = choice
        .and_then(|c| c.message.and_then(|m| m.content).or(c.text))
        .unwrap_or_default();

    Ok(BackendReply::new(model.clone(), text).with_metadata(serde_json::json!({
        "provider": "cerebras",
        "finish_reason": finish_reason,
        "usage": parsed.usage,
    })))
}

#[async_trait]
impl ProviderAdapter for CerebrasAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Cerebras
    }

    async fn generate(
        &self,
        model: &Model,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BackendReply, GatewayError> {
        let request = ChatRequest {
            model: model.name(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: PromptTemplate::evaluation_system(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            max_completion_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(model = %model, status = status.as_u16(), bytes = body.len(), "Cerebras response");

        parse_response(model, status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Model {
        Model::cerebras("llama-3.3-70b")
    }

    #[test]
    fn test_parse_message_content() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"selected_options\":[\"B\"]}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let reply = parse_response(&model(), StatusCode::OK, body).unwrap();
        assert_eq!(reply.text, r#"{"selected_options":["B"]}"#);
        assert_eq!(reply.raw_metadata["finish_reason"], "stop");
        assert_eq!(reply.raw_metadata["usage"]["prompt_tokens"], 10);
    }

    #[test]
    fn test_parse_legacy_text_choice() {
        let body = r#"{"choices": [{"text": "B"}]}"#;
        let reply = parse_response(&model(), StatusCode::OK, body).unwrap();
        assert_eq!(reply.text, "B");
    }

    #[test]
    fn test_no_choices_is_empty_reply() {
        let reply = parse_response(&model(), StatusCode::OK, r#"{"choices": []}"#).unwrap();
        assert!(reply.text.is_empty());
    }

    #[test]
    fn test_http_error_uses_api_message() {
        let body = r#"{"message": "Wrong API Key", "type": "invalid_request_error"}"#;
        let err = parse_response(&model(), StatusCode::UNAUTHORIZED, body).unwrap_err();
        assert_eq!(
            err,
            GatewayError::HttpStatus {
                status: 401,
                message: "Wrong API Key".to_string()
            }
        );
    }

    #[test]
    fn test_http_error_with_plain_body() {
        let err = parse_response(&model(), StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert!(matches!(err, GatewayError::HttpStatus { status: 502, ref message } if message == "upstream down"));
    }

    #[test]
    fn test_garbage_success_body_is_invalid() {
        let err = parse_response(&model(), StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "llama-3.3-70b",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "q",
                },
            ],
            stream: false,
            max_completion_tokens: 1024,
            temperature: 0.1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama-3.3-70b");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "q");
        assert_eq!(json["max_completion_tokens"], 1024);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let adapter =
            CerebrasAdapter::new("key", "https://example.test/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(adapter.chat_url(), "https://example.test/v1/chat/completions");
    }
}
