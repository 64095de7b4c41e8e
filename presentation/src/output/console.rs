//! Console output formatter for solve results

use crate::output::formatter::{ErrorPayload, OutputFormatter};
use colored::Colorize;
use mcq_application::SolveOutput;
use mcq_domain::{Decision, EnsembleResult, ModelVerdict};

/// Formats solve results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Force plain output when colors are disabled in config
    pub fn set_color(enabled: bool) {
        if !enabled {
            colored::control::set_override(false);
        }
    }

    /// Format the result for humans
    pub fn format(output: &SolveOutput) -> String {
        let mut out = String::new();

        out.push_str(&Self::header("MCQ Quorum Results"));
        out.push('\n');

        if output.questions.is_empty() {
            out.push_str(&format!("\n{}\n", "No questions answered.".yellow()));
        }

        for answered in &output.questions {
            out.push_str(&format!(
                "\n{} {}\n",
                format!("Q{}", answered.question_id).cyan().bold(),
                answered.question
            ));

            if answered.answer.is_empty() {
                out.push_str(&format!("   {}\n", "(no answer)".red()));
            }
            for answer in &answered.answer {
                out.push_str(&format!("   {} {}\n", "->".green().bold(), answer.bold()));
            }

            if let Some(ensemble) = Self::ensemble_for(output, &answered.question_id) {
                out.push_str(&Self::ensemble_details(ensemble));
            }
        }

        out.push_str(&format!(
            "\n{} {}\n",
            "Models:".cyan().bold(),
            output
                .metadata
                .models
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        out.push_str(&format!(
            "{} {}\n",
            "Timestamp:".dimmed(),
            output.metadata.timestamp.dimmed()
        ));
        if let Some(debug) = &output.debug {
            out.push_str(&format!(
                "{} #{} via {}\n",
                "Request:".dimmed(),
                debug.request_id,
                debug.extraction_path
            ));
        }

        out.push_str(&Self::footer());
        out
    }

    /// Format as the JSON payload
    pub fn format_json(output: &SolveOutput) -> String {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_error_json(error: &ErrorPayload) -> String {
        serde_json::to_string_pretty(error).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_error_pretty(error: &ErrorPayload) -> String {
        format!(
            "{} {} ({})",
            "Error:".red().bold(),
            error.message,
            error.error.dimmed()
        )
    }

    fn ensemble_for<'a>(output: &'a SolveOutput, question_id: &str) -> Option<&'a EnsembleResult> {
        output
            .debug
            .as_ref()?
            .ensembles
            .iter()
            .find(|e| e.question_id == question_id)
    }

    fn ensemble_details(result: &EnsembleResult) -> String {
        let mut out = String::new();

        let decision = match result.decision {
            Decision::Quota => "quota",
            Decision::TopScore => "top score",
            Decision::NoVotes => "no votes",
        };
        out.push_str(&format!(
            "   {} {:.0}%  {} {}/{}  {} {}{}\n",
            "confidence".dimmed(),
            result.final_confidence * 100.0,
            "answered".dimmed(),
            result.answered_count(),
            result.per_model.len(),
            "decision".dimmed(),
            decision,
            if result.ambiguous {
                format!("  {}", "(multiple)".yellow())
            } else {
                String::new()
            }
        ));

        let probabilities = result
            .option_probabilities
            .iter()
            .map(|(label, p)| format!("{}={:.2}", label, p))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!("   {} {}\n", "scores".dimmed(), probabilities));

        for verdict in &result.per_model {
            out.push_str(&Self::verdict_line(verdict));
        }
        out
    }

    fn verdict_line(verdict: &ModelVerdict) -> String {
        match verdict {
            ModelVerdict::Answered {
                model,
                weight,
                raw_labels,
                confidence,
                ..
            } => format!(
                "     {} {} (w={:.2}): {} @ {:.2}\n",
                "v".green(),
                model,
                weight,
                raw_labels.join(","),
                confidence
            ),
            ModelVerdict::Unparsed { model, .. } => {
                format!("     {} {}: unparseable reply\n", "?".yellow(), model)
            }
            ModelVerdict::Failed { model, error } => {
                format!("     {} {}: {}\n", "x".red(), model, error)
            }
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

/// JSON formatter, the default output
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format(&self, output: &SolveOutput) -> String {
        ConsoleFormatter::format_json(output)
    }

    fn format_error(&self, error: &ErrorPayload) -> String {
        ConsoleFormatter::format_error_json(error)
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, output: &SolveOutput) -> String {
        Self::format(output)
    }

    fn format_error(&self, error: &ErrorPayload) -> String {
        Self::format_error_pretty(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcq_application::{AnsweredQuestion, SolveMetadata};
    use mcq_domain::Model;

    fn output() -> SolveOutput {
        SolveOutput {
            original_text: None,
            questions: vec![AnsweredQuestion {
                question: "Which is prime?".to_string(),
                answer: vec!["B) 3".to_string()],
                question_id: "1".to_string(),
            }],
            metadata: SolveMetadata {
                models: vec![Model::cerebras("llama-3.3-70b")],
                timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            },
            debug: None,
        }
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&output())).unwrap();
        assert_eq!(json["questions"][0]["answer"][0], "B) 3");
        assert_eq!(json["questions"][0]["question_id"], "1");
        assert_eq!(json["metadata"]["models"][0], "cerebras:llama-3.3-70b");
        assert!(json.get("debug").is_none());
        assert!(json.get("originalText").is_none());
    }

    #[test]
    fn test_pretty_lists_answers() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&output());
        assert!(text.contains("Q1 Which is prime?"));
        assert!(text.contains("-> B) 3"));
        assert!(text.contains("cerebras:llama-3.3-70b"));
    }

    #[test]
    fn test_formatter_trait_dispatch() {
        let payload = ErrorPayload::new("no_models", "No models configured");
        let formatters: Vec<Box<dyn OutputFormatter>> =
            vec![Box::new(JsonFormatter), Box::new(ConsoleFormatter)];
        let json = formatters[0].format_error(&payload);
        assert!(json.contains("\"error\": \"no_models\""));
        colored::control::set_override(false);
        let pretty = formatters[1].format_error(&payload);
        assert!(pretty.contains("No models configured"));
    }
}
