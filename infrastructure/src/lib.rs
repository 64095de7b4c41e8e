//! Infrastructure layer for mcq-quorum
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer (model backends, vision, OCR), plus
//! configuration file loading.

pub mod config;
pub mod ocr;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileCerebrasConfig, FileConfig, FileGeminiConfig,
    FileOcrSpaceConfig, FileOutputConfig, FileProvidersConfig,
};
pub use ocr::OcrSpaceExtractor;
pub use providers::{
    CerebrasAdapter, GeminiAdapter, ProviderAdapter, ProviderRegistry, ProviderStatus,
    RoutingGateway, resolve_api_key,
};
