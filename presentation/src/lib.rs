//! Presentation layer for mcq-quorum
//!
//! This crate contains the CLI definition, output formatters
//! and progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, InputSource, OutputFormat};
pub use output::console::{ConsoleFormatter, JsonFormatter};
pub use output::formatter::{ErrorPayload, OutputFormatter};
pub use progress::reporter::{ProgressReporter, SimpleProgress};
