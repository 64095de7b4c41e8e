//! Vision extraction port
//!
//! A vision extractor reads questions straight from an image.

use async_trait::async_trait;
use mcq_domain::Question;
use thiserror::Error;

/// Raw image bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Build from bytes, detecting the MIME type from the file signature.
    ///
    /// Unknown signatures are treated as PNG.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = sniff_mime(&bytes);
        Self::new(bytes, mime_type)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension matching the MIME type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}

/// Errors reported by a vision extractor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VisionError {
    #[error("Vision service overloaded: {0}")]
    Overloaded(String),

    #[error("Vision quota exceeded: {0}")]
    RateLimited(String),

    #[error("Vision extraction failed: {0}")]
    Other(String),
}

impl VisionError {
    /// Capacity problems mean the service is unavailable, not that the image
    /// is unreadable; only these justify a fallback path.
    pub fn is_transient_capacity(&self) -> bool {
        matches!(self, VisionError::Overloaded(_) | VisionError::RateLimited(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VisionError::Overloaded(_) => "overloaded",
            VisionError::RateLimited(_) => "rate_limited",
            VisionError::Other(_) => "other",
        }
    }
}

/// Reads multiple-choice questions from an image
#[async_trait]
pub trait VisionExtractor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Extract all complete questions visible in the image
    async fn extract(&self, image: &ImageInput) -> Result<Vec<Question>, VisionError>;

    /// Re-read the image after a suspicious extraction.
    ///
    /// Extractors that cannot correct report an error, which callers treat
    /// as "keep the original extraction".
    async fn correct(
        &self,
        _image: &ImageInput,
        _previous: &[Question],
    ) -> Result<Vec<Question>, VisionError> {
        Err(VisionError::Other(format!(
            "{} does not support correction",
            self.name()
        )))
    }
}
