//! Question extraction with fallback
//!
//! ```text
//! PrimaryVision ──ok──────────────────────────────► (self-correction?) ──► done
//!      │
//!      ├─ overloaded / rate limited ──► SecondaryTextOcr ──► LlmStructuring ──► done
//!      │
//!      └─ any other error ──► ExtractionError (no fallback)
//! ```
//!
//! The whole chain runs under the extraction timeout.

use crate::ports::llm_gateway::{GatewayError, GenerationParams, LlmGateway};
use crate::ports::ocr::{OcrError, TextExtractor};
use crate::ports::vision::{ImageInput, VisionError, VisionExtractor};
use mcq_domain::core::string::preview;
use mcq_domain::{Model, PromptTemplate, Question, QuestionParseError, parse_question_array};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Errors that end extraction for a request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Vision extraction failed: {0}")]
    Vision(VisionError),

    #[error("Vision unavailable ({0}) and no OCR fallback is configured")]
    NoFallback(VisionError),

    #[error("No vision or OCR extractor is configured")]
    NoExtractor,

    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),

    #[error("Structuring call failed: {0}")]
    StructuringCall(GatewayError),

    #[error("Structuring model did not return valid questions: {0}")]
    Structuring(QuestionParseError),

    #[error("No text provided")]
    EmptyText,

    #[error("No complete questions detected")]
    NoQuestions,

    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),
}

/// Which path produced the questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPath {
    Vision,
    /// Vision output replaced by a corrective re-query
    VisionCorrected,
    /// OCR text structured by an LLM after vision was unavailable
    OcrStructured,
    /// Caller-supplied text structured by an LLM
    Text,
}

impl ExtractionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionPath::Vision => "vision",
            ExtractionPath::VisionCorrected => "vision_corrected",
            ExtractionPath::OcrStructured => "ocr_structured",
            ExtractionPath::Text => "text",
        }
    }
}

impl std::fmt::Display for ExtractionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Questions plus the path that produced them
#[derive(Debug, Clone)]
pub struct Extraction {
    pub questions: Vec<Question>,
    pub path: ExtractionPath,
}

/// Obtains questions from an image or from raw text
pub struct QuestionExtractor<G: LlmGateway + ?Sized> {
    gateway: Arc<G>,
    vision: Option<Arc<dyn VisionExtractor>>,
    ocr: Option<Arc<dyn TextExtractor>>,
    structuring_model: Model,
    params: GenerationParams,
    self_correction: bool,
    timeout: Duration,
}

impl<G: LlmGateway + ?Sized> QuestionExtractor<G> {
    pub fn new(gateway: Arc<G>, structuring_model: Model, timeout: Duration) -> Self {
        Self {
            gateway,
            vision: None,
            ocr: None,
            structuring_model,
            params: GenerationParams::new(0.0, 2048),
            self_correction: true,
            timeout,
        }
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionExtractor>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn TextExtractor>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_self_correction(mut self, enabled: bool) -> Self {
        self.self_correction = enabled;
        self
    }

    /// Extract questions from an image
    pub async fn extract(&self, image: &ImageInput) -> Result<Extraction, ExtractionError> {
        timeout(self.timeout, self.extract_image(image))
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout))?
    }

    /// Structure caller-supplied text into questions
    pub async fn extract_from_text(&self, text: &str) -> Result<Extraction, ExtractionError> {
        let questions = timeout(self.timeout, self.structure_text(text))
            .await
            .map_err(|_| ExtractionError::Timeout(self.timeout))??;
        Ok(Extraction {
            questions,
            path: ExtractionPath::Text,
        })
    }

    async fn extract_image(&self, image: &ImageInput) -> Result<Extraction, ExtractionError> {
        let Some(vision) = &self.vision else {
            debug!("No vision extractor configured, using OCR");
            return self.extract_with_ocr(image, None).await;
        };

        match vision.extract(image).await {
            Ok(questions) if questions.is_empty() => Err(ExtractionError::NoQuestions),
            Ok(questions) => Ok(self.maybe_correct(vision.as_ref(), image, questions).await),
            Err(e) if e.is_transient_capacity() => {
                warn!(
                    extractor = vision.name(),
                    kind = e.kind(),
                    error = %e,
                    "Vision unavailable, falling back to OCR"
                );
                self.extract_with_ocr(image, Some(e)).await
            }
            Err(e) => Err(ExtractionError::Vision(e)),
        }
    }

    async fn extract_with_ocr(
        &self,
        image: &ImageInput,
        vision_error: Option<VisionError>,
    ) -> Result<Extraction, ExtractionError> {
        let Some(ocr) = &self.ocr else {
            return Err(match vision_error {
                Some(e) => ExtractionError::NoFallback(e),
                None => ExtractionError::NoExtractor,
            });
        };

        let text = ocr.extract_text(image).await?;
        info!(extractor = ocr.name(), chars = text.len(), "OCR complete");
        let questions = self.structure_text(&text).await?;
        Ok(Extraction {
            questions,
            path: ExtractionPath::OcrStructured,
        })
    }

    async fn maybe_correct(
        &self,
        vision: &dyn VisionExtractor,
        image: &ImageInput,
        questions: Vec<Question>,
    ) -> Extraction {
        let suspicious = questions.iter().any(Question::has_malformed_options);
        if !self.self_correction || !suspicious {
            return Extraction {
                questions,
                path: ExtractionPath::Vision,
            };
        }

        info!("Extracted options look malformed, asking for a correction");
        match vision.correct(image, &questions).await {
            Ok(corrected) if !corrected.is_empty() => Extraction {
                questions: corrected,
                path: ExtractionPath::VisionCorrected,
            },
            Ok(_) => {
                warn!("Correction returned no questions, keeping original extraction");
                Extraction {
                    questions,
                    path: ExtractionPath::Vision,
                }
            }
            Err(e) => {
                warn!(error = %e, "Correction failed, keeping original extraction");
                Extraction {
                    questions,
                    path: ExtractionPath::Vision,
                }
            }
        }
    }

    /// Ask the structuring model to turn raw text into questions.
    ///
    /// One retry with a stricter prompt when the first reply is unusable.
    async fn structure_text(&self, text: &str) -> Result<Vec<Question>, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyText);
        }

        let first = self
            .ask_structuring(&PromptTemplate::structuring_prompt(text))
            .await?;
        match parse_question_array(&first) {
            Ok(questions) => {
                info!(count = questions.len(), "Structured text into questions");
                return Ok(questions);
            }
            Err(e) => {
                warn!(
                    error = %e,
                    reply = %preview(&first, 120),
                    "First structuring attempt failed, retrying with stricter prompt"
                );
            }
        }

        let retry = self
            .ask_structuring(&PromptTemplate::structuring_retry_prompt(text))
            .await?;
        let questions = parse_question_array(&retry).map_err(|e| {
            warn!(error = %e, "Structuring retry failed");
            ExtractionError::Structuring(e)
        })?;
        info!(count = questions.len(), "Structured text into questions on retry");
        Ok(questions)
    }

    async fn ask_structuring(&self, prompt: &str) -> Result<String, ExtractionError> {
        let reply = self
            .gateway
            .invoke(&self.structuring_model, prompt, &self.params)
            .await
            .map_err(ExtractionError::StructuringCall)?;
        Ok(reply.text)
    }
}
