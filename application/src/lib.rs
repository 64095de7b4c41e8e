//! Application layer for mcq-quorum
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{PipelineConfig, TimeoutConfig};
pub use ports::{
    llm_gateway::{BackendReply, GatewayError, GenerationParams, LlmGateway},
    ocr::{OcrError, TextExtractor},
    progress::{NoProgress, ProgressNotifier},
    vision::{ImageInput, VisionError, VisionExtractor},
};
pub use use_cases::dispatch::{DispatchError, ModelDispatcher, order_models};
pub use use_cases::extract_questions::{
    Extraction, ExtractionError, ExtractionPath, QuestionExtractor,
};
pub use use_cases::solve_mcqs::{
    AnsweredQuestion, SolveDebug, SolveError, SolveMcqsUseCase, SolveMetadata, SolveOptions,
    SolveOutput,
};
