//! OCR.space adapter (multipart upload to `/parse/image`).

use async_trait::async_trait;
use mcq_application::ports::ocr::{OcrError, TextExtractor};
use mcq_application::ports::vision::ImageInput;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.ocr.space";
pub const API_KEY_ENV: &str = "OCR_API_KEY";
pub const DEFAULT_LANGUAGE: &str = "eng";

pub struct OcrSpaceExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl OcrSpaceExtractor {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::RequestFailed(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            language: DEFAULT_LANGUAGE.to_string(),
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    fn parse_url(&self) -> String {
        format!("{}/parse/image", self.base_url)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<ErrorMessage>,
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
}

/// OCR.space reports errors as a string or a list of strings
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    fn joined(self) -> String {
        match self {
            ErrorMessage::One(s) => s,
            ErrorMessage::Many(v) => v.join(", "),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

/// Join the text of all parsed results; no results is an empty string
fn parse_response(body: &str) -> Result<String, OcrError> {
    let parsed: OcrResponse = serde_json::from_str(body)
        .map_err(|e| OcrError::Provider(format!("invalid OCR response: {e}")))?;

    if parsed.is_errored_on_processing {
        let message = parsed
            .error_message
            .map(ErrorMessage::joined)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(OcrError::Provider(message));
    }

    Ok(parsed
        .parsed_results
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.parsed_text.unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n"))
}

#[async_trait]
impl TextExtractor for OcrSpaceExtractor {
    fn name(&self) -> &str {
        "ocr.space"
    }

    async fn extract_text(&self, image: &ImageInput) -> Result<String, OcrError> {
        let file = Part::bytes(image.bytes().to_vec())
            .file_name(format!("image.{}", image.extension()))
            .mime_str(image.mime_type())
            .map_err(|e| OcrError::RequestFailed(e.to_string()))?;

        let form = Form::new()
            .text("apikey", self.api_key.clone())
            .text("language", self.language.clone())
            .text("isOverlayRequired", "false")
            .part("file", file);

        let response = self
            .client
            .post(self.parse_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| OcrError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrError::RequestFailed(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "OCR.space response");

        if !status.is_success() {
            return Err(OcrError::Provider(format!(
                "HTTP {}: {}",
                status.as_u16(),
                mcq_domain::core::string::preview(body.trim(), 200)
            )));
        }

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joins_parsed_results() {
        let body = r#"{
            "ParsedResults": [
                {"ParsedText": "1. Which is prime?", "FileParseExitCode": 1},
                {"ParsedText": "A) 4 B) 5"}
            ],
            "IsErroredOnProcessing": false
        }"#;
        assert_eq!(parse_response(body).unwrap(), "1. Which is prime?\nA) 4 B) 5");
    }

    #[test]
    fn test_no_results_is_empty_text() {
        let body = r#"{"IsErroredOnProcessing": false, "ParsedResults": []}"#;
        assert_eq!(parse_response(body).unwrap(), "");
        assert_eq!(parse_response("{}").unwrap(), "");
    }

    #[test]
    fn test_processing_error_list() {
        let body = r#"{
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["File failed validation", "Unsupported type"]
        }"#;
        assert_eq!(
            parse_response(body).unwrap_err(),
            OcrError::Provider("File failed validation, Unsupported type".to_string())
        );
    }

    #[test]
    fn test_processing_error_without_message() {
        let body = r#"{"IsErroredOnProcessing": true}"#;
        assert_eq!(
            parse_response(body).unwrap_err(),
            OcrError::Provider("Unknown error".to_string())
        );
    }

    #[test]
    fn test_processing_error_string() {
        let body = r#"{"IsErroredOnProcessing": true, "ErrorMessage": "Timed out"}"#;
        assert_eq!(
            parse_response(body).unwrap_err(),
            OcrError::Provider("Timed out".to_string())
        );
    }

    #[test]
    fn test_parse_url() {
        let ocr = OcrSpaceExtractor::new("k", "https://api.ocr.space/", Duration::from_secs(5))
            .unwrap()
            .with_language("ger");
        assert_eq!(ocr.parse_url(), "https://api.ocr.space/parse/image");
        assert_eq!(ocr.language, "ger");
    }
}
