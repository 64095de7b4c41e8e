//! CLI entrypoint for mcq-quorum
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use mcq_application::{
    ImageInput, NoProgress, ProgressNotifier, SolveMcqsUseCase, SolveOptions,
};
use mcq_domain::{ConfigIssue, Model};
use mcq_infrastructure::{ConfigLoader, FileConfig, ProviderRegistry};
use mcq_presentation::{
    Cli, ConsoleFormatter, ErrorPayload, InputSource, JsonFormatter, OutputFormatter,
    ProgressReporter, SimpleProgress,
};
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting mcq-quorum");

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    if cli.check {
        return Ok(check_providers(&config));
    }

    let issues = config.validate();
    report_issues(&issues);
    let pipeline = config
        .to_pipeline_config()
        .context("Configuration is invalid (see errors above)")?;

    let Some(input) = cli.input_source() else {
        bail!("An image path, --text or --text-file is required. See --help.");
    };

    let requested_models = parse_models(&cli.model)?;

    // === Dependency Injection ===
    let registry = ProviderRegistry::from_config(&config.providers, pipeline.timeouts.request)?;
    let mut use_case = SolveMcqsUseCase::new(registry.gateway.clone(), pipeline);
    if let Some(vision) = registry.vision.clone() {
        use_case = use_case.with_vision(vision);
    }
    if let Some(ocr) = registry.ocr.clone() {
        use_case = use_case.with_ocr(ocr);
    }

    let mut options = SolveOptions::default().with_debug(cli.debug);
    if let Some(models) = requested_models {
        options = options.with_models(models);
    }

    let progress = select_progress(
        cli.quiet || !config.output.show_progress,
        std::io::stderr().is_terminal(),
    );

    // === Execute ===
    let result = match input {
        InputSource::Image(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            let image = ImageInput::from_bytes(bytes);
            use_case
                .process_image_with_progress(&image, &options, progress.as_ref())
                .await
        }
        InputSource::Text(text) => {
            use_case
                .process_text_with_progress(&text, &options, progress.as_ref())
                .await
        }
        InputSource::TextFile(path) => {
            let text = read_text(&path)?;
            use_case
                .process_text_with_progress(&text, &options, progress.as_ref())
                .await
        }
    };

    // === Output ===
    ConsoleFormatter::set_color(config.output.color);
    let format = cli
        .output
        .map(mcq_domain::OutputFormat::from)
        .or(config.output.format)
        .unwrap_or_default();
    let formatter: Box<dyn OutputFormatter> = match format {
        mcq_domain::OutputFormat::Json => Box::new(JsonFormatter),
        mcq_domain::OutputFormat::Pretty => Box::new(ConsoleFormatter),
    };

    match result {
        Ok(output) => {
            info!(questions = output.questions.len(), "Request complete");
            println!("{}", formatter.format(&output));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(code = e.code(), error = %e, "Request failed");
            println!("{}", formatter.format_error(&ErrorPayload::from(&e)));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Initialize logging based on verbosity level, or `RUST_LOG` when set.
///
/// Logs go to stderr so stdout carries only the result payload.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn report_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        if issue.is_error() {
            eprintln!("config error: {}", issue.message);
        } else {
            warn!("{}", issue.message);
        }
    }
}

/// Pick the progress display: bars on a terminal, plain lines otherwise
fn select_progress(quiet: bool, stderr_is_terminal: bool) -> Box<dyn ProgressNotifier> {
    match (quiet, stderr_is_terminal) {
        (true, _) => Box::new(NoProgress),
        (false, true) => Box::new(ProgressReporter::new()),
        (false, false) => Box::new(SimpleProgress),
    }
}

/// Parse `-m` overrides; none given means "use the configured list"
fn parse_models(values: &[String]) -> Result<Option<Vec<Model>>> {
    if values.is_empty() {
        return Ok(None);
    }
    values
        .iter()
        .map(|s| {
            s.parse::<Model>()
                .with_context(|| format!("Invalid --model '{}'", s))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Read question text from a file, or stdin for `-`
fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read text from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Print which providers have API keys; succeed if any answer backend does
fn check_providers(config: &FileConfig) -> ExitCode {
    let statuses = ProviderRegistry::health(&config.providers);
    for status in &statuses {
        println!(
            "{:<10} {:<8} ({})",
            status.name,
            if status.configured { "ok" } else { "missing" },
            status.env_var
        );
    }

    let any_backend = statuses
        .iter()
        .any(|s| s.configured && (s.name == "cerebras" || s.name == "gemini"));
    if any_backend {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_models() {
        assert_eq!(parse_models(&[]).unwrap(), None);
        let models = parse_models(&["cerebras:llama-3.3-70b".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(models, vec![Model::cerebras("llama-3.3-70b")]);
        assert!(parse_models(&["llama".to_string()]).is_err());
    }

    #[test]
    fn test_select_progress_without_terminal() {
        for (quiet, tty) in [(true, true), (true, false), (false, false)] {
            let progress = select_progress(quiet, tty);
            progress.on_model_complete("1", &Model::cerebras("llama-3.3-70b"), true);
        }
    }
}
