//! Gemini adapter (`generateContent`).
//!
//! Serves two roles: a text backend for answer evaluation and the vision
//! extractor that reads questions straight from an image.

use super::{ProviderAdapter, clip_body, http_client, transport_error};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mcq_application::ports::llm_gateway::{BackendReply, GatewayError, GenerationParams};
use mcq_application::ports::vision::{ImageInput, VisionError, VisionExtractor};
use mcq_domain::core::string::preview;
use mcq_domain::{
    Model, PromptTemplate, ProviderFamily, Question, QuestionParseError, parse_question_array,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_VISION_MODEL: &str = "gemini-2.5-flash";

/// Gemini REST client
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    vision_model: Model,
    vision_params: GenerationParams,
}

impl GeminiAdapter {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            vision_model: Model::gemini(DEFAULT_VISION_MODEL),
            vision_params: GenerationParams::new(0.0, 4096),
        })
    }

    pub fn with_vision_model(mut self, model: Model) -> Self {
        self.vision_model = model;
        self
    }

    pub fn with_vision_params(mut self, params: GenerationParams) -> Self {
        self.vision_params = params;
        self
    }

    fn generate_url(&self, model: &Model) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model.name())
    }

    async fn generate_content(
        &self,
        model: &Model,
        parts: Vec<Part>,
        params: &GenerationParams,
    ) -> Result<BackendReply, GatewayError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.generate_url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(model = %model, status = status.as_u16(), bytes = body.len(), "Gemini response");

        parse_response(model, status.as_u16(), &body)
    }

    /// Run a vision prompt against the image and parse the question array
    async fn read_questions(
        &self,
        image: &ImageInput,
        prompt: String,
    ) -> Result<Vec<Question>, VisionError> {
        let parts = vec![Part::inline(image), Part::text(prompt)];
        let reply = self
            .generate_content(&self.vision_model, parts, &self.vision_params)
            .await
            .map_err(vision_error)?;

        match parse_question_array(&reply.text) {
            Ok(questions) => Ok(questions),
            Err(QuestionParseError::NoQuestions) => Ok(Vec::new()),
            Err(QuestionParseError::NotJson) => {
                warn!(reply = %preview(&reply.text, 160), "Vision reply is not JSON");
                Err(VisionError::Other("vision reply was not JSON".to_string()))
            }
        }
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(image: &ImageInput) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type().to_string(),
                data: STANDARD.encode(image.bytes()),
            }),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Turn a raw HTTP response into a reply.
///
/// Text parts of the first candidate are concatenated. The error status name
/// (e.g. `RESOURCE_EXHAUSTED`) is kept in the message so callers can classify it.
fn parse_response(model: &Model, status: u16, body: &str) -> Result<BackendReply, GatewayError> {
    if !(200..300).contains(&status) {
        let message = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => match (envelope.error.status, envelope.error.message) {
                (Some(s), Some(m)) => format!("{s}: {m}"),
                (Some(s), None) => s,
                (None, Some(m)) => m,
                (None, None) => clip_body(body),
            },
            Err(_) => clip_body(body),
        };
        return Err(GatewayError::HttpStatus { status, message });
    }

    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("gemini: {e}")))?;

    let candidate = parsed.candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let text: String = candidate
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    Ok(BackendReply::new(model.clone(), text).with_metadata(serde_json::json!({
        "provider": "gemini",
        "finish_reason": finish_reason,
        "usage": parsed.usage_metadata,
    })))
}

/// Classify a failed vision call.
///
/// Only capacity problems (overload, quota) become fallback-eligible errors.
fn vision_error(err: GatewayError) -> VisionError {
    let (status, message) = match &err {
        GatewayError::HttpStatus { status, message } => (Some(*status), message.clone()),
        other => (None, other.to_string()),
    };
    let lower = message.to_lowercase();

    if status == Some(503) || lower.contains("overloaded") {
        VisionError::Overloaded(message)
    } else if status == Some(429) || lower.contains("quota") || message.contains("RESOURCE_EXHAUSTED")
    {
        VisionError::RateLimited(message)
    } else {
        VisionError::Other(err.to_string())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn family(&self) -> ProviderFamily {
        ProviderFamily::Gemini
    }

    async fn generate(
        &self,
        model: &Model,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BackendReply, GatewayError> {
        self.generate_content(model, vec![Part::text(prompt)], params)
            .await
    }
}

#[async_trait]
impl VisionExtractor for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini-vision"
    }

    async fn extract(&self, image: &ImageInput) -> Result<Vec<Question>, VisionError> {
        self.read_questions(image, PromptTemplate::vision_extraction_prompt())
            .await
    }

    async fn correct(
        &self,
        image: &ImageInput,
        previous: &[Question],
    ) -> Result<Vec<Question>, VisionError> {
        self.read_questions(image, PromptTemplate::vision_correction_prompt(previous))
            .await
    }
}
