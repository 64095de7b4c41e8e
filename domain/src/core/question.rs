//! Question value object

use super::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Option text shorter than this (in characters) is treated as a likely
/// extraction mistake.
const MIN_OPTION_TEXT_CHARS: usize = 2;

/// One answer option of a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Canonical label (e.g. "A", "1")
    pub label: String,
    /// Option text as extracted
    pub text: String,
}

impl QuestionOption {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Check whether this option looks like an extraction mistake:
    /// the text repeats the label, or is implausibly short.
    pub fn looks_malformed(&self) -> bool {
        let text = self.text.trim();
        text.eq_ignore_ascii_case(self.label.trim()) || text.chars().count() < MIN_OPTION_TEXT_CHARS
    }
}

/// A multiple-choice question (Value Object)
///
/// Immutable once constructed. Construction guarantees at least one option
/// and unique, non-empty canonical labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: String,
    text: String,
    options: Vec<QuestionOption>,
    allows_multiple_answers: bool,
}

impl Question {
    /// Create a validated question
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: Vec<QuestionOption>,
        allows_multiple_answers: bool,
    ) -> Result<Self, DomainError> {
        let id = id.into();

        if options.is_empty() {
            return Err(DomainError::NoOptions(id));
        }

        let mut seen = HashSet::with_capacity(options.len());
        for option in &options {
            if option.label.trim().is_empty() {
                return Err(DomainError::EmptyLabel(id));
            }
            if !seen.insert(option.label.as_str()) {
                return Err(DomainError::DuplicateLabel {
                    question_id: id,
                    label: option.label.clone(),
                });
            }
        }

        Ok(Self {
            id,
            text: text.into(),
            options,
            allows_multiple_answers,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    pub fn allows_multiple_answers(&self) -> bool {
        self.allows_multiple_answers
    }

    /// Find an option by its canonical label
    pub fn option(&self, label: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.label == label)
    }

    /// Position of a canonical label in option order
    pub fn position(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|o| o.label == label)
    }

    /// Render a selected label as `"label) text"`, or the bare label when
    /// it is not one of this question's options.
    pub fn render_answer(&self, label: &str) -> String {
        match self.option(label) {
            Some(option) => format!("{}) {}", option.label, option.text),
            None => label.to_string(),
        }
    }

    /// Check whether any option looks like an extraction mistake
    pub fn has_malformed_options(&self) -> bool {
        self.options.iter().any(QuestionOption::looks_malformed)
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.text)?;
        for option in &self.options {
            writeln!(f, "{}) {}", option.label, option.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(labels: &[&str]) -> Vec<QuestionOption> {
        labels
            .iter()
            .map(|l| QuestionOption::new(*l, format!("Option {}", l)))
            .collect()
    }

    #[test]
    fn test_question_creation() {
        let q = Question::new("1", "Pick one", options(&["A", "B"]), false).unwrap();
        assert_eq!(q.id(), "1");
        assert_eq!(q.options().len(), 2);
        assert_eq!(q.position("B"), Some(1));
        assert!(!q.allows_multiple_answers());
    }

    #[test]
    fn test_no_options_rejected() {
        let err = Question::new("7", "Empty", vec![], false).unwrap_err();
        assert_eq!(err, DomainError::NoOptions("7".to_string()));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let err = Question::new("2", "Dup", options(&["A", "B", "A"]), false).unwrap_err();
        assert!(matches!(err, DomainError::DuplicateLabel { ref label, .. } if label == "A"));
    }

    #[test]
    fn test_empty_label_rejected() {
        let err = Question::new("3", "Blank", options(&["A", " "]), false).unwrap_err();
        assert_eq!(err, DomainError::EmptyLabel("3".to_string()));
    }

    #[test]
    fn test_render_answer() {
        let q = Question::new(
            "1",
            "Abstract classes",
            vec![
                QuestionOption::new("A", "It will not compile."),
                QuestionOption::new("B", "The class can still be abstract."),
            ],
            false,
        )
        .unwrap();
        assert_eq!(q.render_answer("B"), "B) The class can still be abstract.");
        assert_eq!(q.render_answer("Z"), "Z");
    }

    #[test]
    fn test_malformed_option_detection() {
        assert!(QuestionOption::new("A", "A").looks_malformed());
        assert!(QuestionOption::new("B", " b ").looks_malformed());
        assert!(QuestionOption::new("C", "x").looks_malformed());
        assert!(!QuestionOption::new("D", "42").looks_malformed());

        let q = Question::new("1", "Q", options(&["A", "B"]), false).unwrap();
        assert!(!q.has_malformed_options());
    }
}
