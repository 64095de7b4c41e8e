//! Output format value object

use serde::{Deserialize, Serialize};

/// Output format for solved questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The `{questions, metadata}` JSON payload (default)
    #[default]
    Json,
    /// Human-readable terminal output
    Pretty,
}
