//! Question lists recovered from extractor or structuring replies.

use super::repair::{JsonShape, repair_json};
use crate::core::question::{Question, QuestionOption};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

const TEXT_KEYS: &[&str] = &["question", "text", "prompt"];
const ID_KEYS: &[&str] = &["id", "question_id"];
const MULTI_KEYS: &[&str] = &[
    "multiChoice",
    "multi_choice",
    "allows_multiple_answers",
    "is_multiple_correct",
];

/// Why a question list could not be recovered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestionParseError {
    #[error("reply contained no JSON question list")]
    NotJson,

    #[error("reply contained no valid questions")]
    NoQuestions,
}

/// Parse a reply into questions.
///
/// Accepts an array of questions, a single question object, or an object
/// wrapping the array under `questions`. Invalid entries are dropped.
pub fn parse_question_array(raw_text: &str) -> Result<Vec<Question>, QuestionParseError> {
    let value = repair_json(raw_text, JsonShape::ObjectOrArray).ok_or(QuestionParseError::NotJson)?;
    let questions = questions_from_value(&value);
    if questions.is_empty() {
        return Err(QuestionParseError::NoQuestions);
    }
    Ok(questions)
}

/// Convert an already-parsed JSON value into validated questions
pub fn questions_from_value(value: &Value) -> Vec<Question> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("questions") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![value],
        },
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Some(object) = entry.as_object() else {
                warn!(index, "Dropping question entry that is not an object");
                return None;
            };
            match question_from_object(index, object) {
                Ok(question) => Some(question),
                Err(e) => {
                    warn!(index, error = %e, "Dropping invalid question");
                    None
                }
            }
        })
        .collect()
}

fn question_from_object(
    index: usize,
    object: &Map<String, Value>,
) -> Result<Question, crate::core::error::DomainError> {
    let id = first_of(object, ID_KEYS)
        .and_then(scalar_string)
        .unwrap_or_else(|| (index + 1).to_string());

    let text = first_of(object, TEXT_KEYS)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let options = match object.get("options") {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| option_from_value(i, item))
            .collect(),
        _ => Vec::new(),
    };

    let allows_multiple = first_of(object, MULTI_KEYS)
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Question::new(id, text, options, allows_multiple)
}

fn option_from_value(position: usize, value: &Value) -> Option<QuestionOption> {
    match value {
        Value::String(text) => Some(QuestionOption::new(default_label(position), text.trim())),
        Value::Object(object) => {
            let label = object
                .get("label")
                .and_then(scalar_string)
                .map(|l| l.trim().to_uppercase())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| default_label(position));
            let text = object
                .get("text")
                .and_then(scalar_string)
                .unwrap_or_default();
            Some(QuestionOption::new(label, text.trim()))
        }
        _ => None,
    }
}

/// `A`..`Z` for the first 26 positions, then the 1-based position
fn default_label(position: usize) -> String {
    match u8::try_from(position) {
        Ok(p) if p < 26 => char::from(b'A' + p).to_string(),
        _ => (position + 1).to_string(),
    }
}

fn first_of<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(*k).filter(|v| !v.is_null()))
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
