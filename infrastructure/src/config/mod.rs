//! Configuration file loading for mcq-quorum
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MCQ_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./mcq-quorum.toml` or `./.mcq-quorum.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/mcq-quorum/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileCerebrasConfig, FileConfig, FileEnsembleConfig,
    FileGenerationConfig, FileGeminiConfig, FileModelsConfig, FileOcrSpaceConfig,
    FileOutputConfig, FilePipelineConfig, FileProvidersConfig, FileTimeoutsConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
