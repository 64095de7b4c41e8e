//! Text OCR port

use super::vision::ImageInput;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcrError {
    #[error("Missing API key (set {0})")]
    MissingApiKey(String),

    #[error("OCR request failed: {0}")]
    RequestFailed(String),

    #[error("OCR provider error: {0}")]
    Provider(String),
}

/// Extracts raw text from an image
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract_text(&self, image: &ImageInput) -> Result<String, OcrError>;
}
