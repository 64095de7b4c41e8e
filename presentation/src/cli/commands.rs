//! CLI command definitions

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for solved questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `{questions, metadata}` JSON payload
    Json,
    /// Human-readable summary
    Pretty,
}

impl From<OutputFormat> for mcq_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => mcq_domain::OutputFormat::Json,
            OutputFormat::Pretty => mcq_domain::OutputFormat::Pretty,
        }
    }
}

/// Where the questions come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Image(PathBuf),
    Text(String),
    TextFile(PathBuf),
}

/// CLI arguments for mcq-quorum
#[derive(Parser, Debug)]
#[command(name = "mcq-quorum")]
#[command(author, version, about = "Answer multiple-choice questions with a weighted model ensemble")]
#[command(long_about = r#"
mcq-quorum reads multiple-choice questions from an image (or text) and asks
several language models to answer each one. Their answers are combined by a
weighted vote.

Pipeline:
1. Extraction: vision model reads the questions (OCR + LLM structuring as fallback)
2. Dispatch: every model answers every question in parallel
3. Ensemble: weighted quota vote picks the answer(s)

Configuration files are loaded from (in priority order):
1. MCQ_* environment variables (e.g. MCQ_TIMEOUTS__REQUEST_SECS=90)
2. --config <path>        Explicit config file
3. ./mcq-quorum.toml      Project-level config
4. ~/.config/mcq-quorum/config.toml   Global config

Example:
  mcq-quorum screenshot.png
  mcq-quorum --text "1. 2+2=? A) 3 B) 4" -o pretty
  mcq-quorum -m cerebras:llama-3.3-70b -m models/gemini-2.5-flash quiz.jpg
"#)]
#[command(group(ArgGroup::new("input").args(["image", "text", "text_file"])))]
pub struct Cli {
    /// Image containing the questions
    pub image: Option<PathBuf>,

    /// Questions as raw text (skips image extraction)
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Read raw question text from a file ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub text_file: Option<PathBuf>,

    /// Models to consult instead of the configured list (can be repeated)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Vec<String>,

    /// Include per-model verdicts and vote details in the output
    #[arg(long)]
    pub debug: bool,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the merged configuration, then exit
    #[arg(long)]
    pub show_config: bool,

    /// Report which provider API keys are set, then exit
    #[arg(long)]
    pub check: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The input to solve, if one was given
    pub fn input_source(&self) -> Option<InputSource> {
        if let Some(text) = &self.text {
            return Some(InputSource::Text(text.clone()));
        }
        if let Some(path) = &self.text_file {
            return Some(InputSource::TextFile(path.clone()));
        }
        self.image.clone().map(InputSource::Image)
    }
}
