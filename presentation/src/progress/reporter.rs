//! Progress reporting for MCQ solving

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mcq_application::ExtractionPath;
use mcq_application::ports::progress::ProgressNotifier;
use mcq_domain::{EnsembleResult, Model, Question};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with indicatif bars on stderr
pub struct ProgressReporter {
    multi: MultiProgress,
    extraction_bar: Mutex<Option<ProgressBar>>,
    question_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            extraction_bar: Mutex::new(None),
            question_bar: Mutex::new(None),
        }
    }

    fn question_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_question_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.question_bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_extraction_start(&self) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix("Extracting");
        pb.set_message("reading questions...");
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.extraction_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_extraction_complete(&self, path: ExtractionPath, question_count: usize) {
        if let Ok(mut slot) = self.extraction_bar.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_with_message(format!(
                "{} {} question(s) via {}",
                "done:".green(),
                question_count,
                path
            ));
        }

        let pb = self.multi.add(ProgressBar::new(question_count as u64));
        pb.set_style(Self::question_style());
        pb.set_prefix("Answering");
        pb.set_message("dispatching...");

        if let Ok(mut slot) = self.question_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_question_start(&self, question: &Question, index: usize, total: usize) {
        self.with_question_bar(|pb| {
            pb.set_message(format!("Q{} ({}/{})", question.id(), index + 1, total));
        });
    }

    fn on_model_complete(&self, question_id: &str, model: &Model, success: bool) {
        self.with_question_bar(|pb| {
            let status = if success {
                format!("{} Q{} {}", "v".green(), question_id, model)
            } else {
                format!("{} Q{} {}", "x".red(), question_id, model)
            };
            pb.set_message(status);
        });
    }

    fn on_question_complete(&self, result: &EnsembleResult) {
        self.with_question_bar(|pb| {
            pb.inc(1);
            if pb.position() >= pb.length().unwrap_or(0) {
                pb.finish_with_message(format!("{}", "all questions answered".green()));
            } else {
                pb.set_message(format!(
                    "Q{} -> {}",
                    result.question_id,
                    result.selected_labels.join(",")
                ));
            }
        });
    }
}

/// Simple text-based progress on stderr (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_extraction_start(&self) {
        eprintln!("{} {}", "->".cyan(), "Extracting questions".bold());
    }

    fn on_extraction_complete(&self, path: ExtractionPath, question_count: usize) {
        eprintln!("  {} {} question(s) via {}", "v".green(), question_count, path);
    }

    fn on_question_start(&self, question: &Question, index: usize, total: usize) {
        eprintln!(
            "{} {} ({}/{})",
            "->".cyan(),
            format!("Q{}", question.id()).bold(),
            index + 1,
            total
        );
    }

    fn on_model_complete(&self, _question_id: &str, model: &Model, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), model);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), model);
        }
    }

    fn on_question_complete(&self, result: &EnsembleResult) {
        eprintln!(
            "  {} {} ({:.0}%)",
            "=".green(),
            result.selected_labels.join(","),
            result.final_confidence * 100.0
        );
    }
}
