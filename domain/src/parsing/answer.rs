//! Structured answers recovered from model replies.

use super::repair::{JsonShape, repair_json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Confidence assumed when a reply does not carry a numeric one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A model's answer to one question
///
/// Parsing is permissive: a recovered JSON object is accepted even when
/// fields are missing, with defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedAnswer {
    /// Labels as the model wrote them (deduplicated, in reply order)
    pub selected_options: Vec<String>,
    /// Self-reported confidence, clamped to `[0, 1]`
    pub confidence: f64,
    /// Short justification
    pub reasoning: String,
    /// Whether the model claimed several options are correct
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_multiple_correct: Option<bool>,
}

impl ParsedAnswer {
    pub fn new<S: Into<String>>(selected_options: Vec<S>, confidence: f64) -> Self {
        let mut answer = Self {
            selected_options: Vec::new(),
            confidence: clamp_confidence(confidence),
            reasoning: String::new(),
            is_multiple_correct: None,
        };
        for label in selected_options {
            answer.push_label(label.into());
        }
        answer
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Build an answer from a recovered JSON object, applying defaults
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let mut answer = Self {
            selected_options: Vec::new(),
            confidence: object
                .get("confidence")
                .and_then(Value::as_f64)
                .map(clamp_confidence)
                .unwrap_or(DEFAULT_CONFIDENCE),
            reasoning: object
                .get("reasoning")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            is_multiple_correct: object.get("is_multiple_correct").and_then(Value::as_bool),
        };

        match object.get("selected_options") {
            Some(Value::Array(items)) => {
                for item in items {
                    match item {
                        Value::String(s) => answer.push_label(s.clone()),
                        Value::Number(n) => answer.push_label(n.to_string()),
                        _ => {}
                    }
                }
            }
            // "A, C" written as one string
            Some(Value::String(s)) => {
                for part in s.split(',') {
                    answer.push_label(part.to_string());
                }
            }
            Some(Value::Number(n)) => answer.push_label(n.to_string()),
            _ => {}
        }

        answer
    }

    fn push_label(&mut self, label: String) {
        let label = label.trim();
        if !label.is_empty() && !self.selected_options.iter().any(|l| l == label) {
            self.selected_options.push(label.to_string());
        }
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONFIDENCE
    }
}

/// Parse a model reply into a [`ParsedAnswer`].
///
/// Never fails: `None` means no JSON object could be recovered.
///
/// # Examples
///
/// ```
/// use mcq_domain::parse_answer;
///
/// let reply = "<think>B, surely</think>\n```json\n{\"selected_options\": [\"B\"], \"confidence\": 0.9}\n```";
/// let answer = parse_answer(reply).unwrap();
/// assert_eq!(answer.selected_options, vec!["B"]);
/// assert_eq!(answer.confidence, 0.9);
///
/// assert!(parse_answer("The answer is B.").is_none());
/// ```
pub fn parse_answer(raw_text: &str) -> Option<ParsedAnswer> {
    if raw_text.trim().is_empty() {
        return None;
    }
    let value = repair_json(raw_text, JsonShape::Object)?;
    value.as_object().map(ParsedAnswer::from_object)
}
