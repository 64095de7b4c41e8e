//! Provider configuration from TOML (`[providers]` section)

use crate::ocr::ocr_space;
use crate::providers::{cerebras, gemini, resolve_api_key};
use serde::{Deserialize, Serialize};

/// Cerebras API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCerebrasConfig {
    /// Environment variable name for the API key (default: "CEREBRAS_API_KEY").
    pub api_key_env: String,
    /// Direct API key (prefer the env var).
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for FileCerebrasConfig {
    fn default() -> Self {
        Self {
            api_key_env: cerebras::API_KEY_ENV.to_string(),
            api_key: None,
            base_url: cerebras::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Gemini API configuration (text backend and vision extractor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGeminiConfig {
    /// Environment variable name for the API key (default: "GEMINI_API_KEY").
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model name used to read questions from images
    pub vision_model: String,
    /// Use Gemini vision for image extraction (OCR only when false)
    pub vision: bool,
}

impl Default for FileGeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: gemini::API_KEY_ENV.to_string(),
            api_key: None,
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            vision_model: gemini::DEFAULT_VISION_MODEL.to_string(),
            vision: true,
        }
    }
}

/// OCR.space configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOcrSpaceConfig {
    /// Environment variable name for the API key (default: "OCR_API_KEY").
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    /// OCR.space language code
    pub language: String,
}

impl Default for FileOcrSpaceConfig {
    fn default() -> Self {
        Self {
            api_key_env: ocr_space::API_KEY_ENV.to_string(),
            api_key: None,
            base_url: ocr_space::DEFAULT_BASE_URL.to_string(),
            language: ocr_space::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub cerebras: FileCerebrasConfig,
    pub gemini: FileGeminiConfig,
    pub ocr_space: FileOcrSpaceConfig,
}

impl FileCerebrasConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

impl FileGeminiConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

impl FileOcrSpaceConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), &self.api_key_env)
    }
}
