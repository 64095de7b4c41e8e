//! Mapping model-written labels back to canonical option labels

use crate::core::question::QuestionOption;
use std::collections::HashMap;

/// Positional letter keys exist only for this many options
const LETTER_KEYS: usize = 26;

/// Resolves whatever label spelling a model used to the question's
/// canonical option label.
///
/// Keys are registered first-wins: canonical labels go in before any
/// positional or text key, so a canonical label always resolves to itself
/// and a later option never steals an earlier option's key.
///
/// # Example
///
/// ```
/// use mcq_domain::{LabelNormalizer, QuestionOption};
///
/// let options = vec![
///     QuestionOption::new("A", "Paris"),
///     QuestionOption::new("B", "Rome"),
/// ];
/// let normalizer = LabelNormalizer::new(&options);
/// assert_eq!(normalizer.normalize("2").as_deref(), Some("B"));
/// assert_eq!(normalizer.normalize("b").as_deref(), Some("B"));
/// assert_eq!(normalizer.normalize("Paris").as_deref(), Some("A"));
/// ```
#[derive(Debug, Clone)]
pub struct LabelNormalizer {
    keys: HashMap<String, String>,
}

impl LabelNormalizer {
    pub fn new(options: &[QuestionOption]) -> Self {
        let mut keys = HashMap::new();
        let mut insert = |key: String, label: &str| {
            if !key.is_empty() {
                keys.entry(key).or_insert_with(|| label.to_string());
            }
        };

        for option in options {
            let label = option.label.as_str();
            insert(label.to_string(), label);
            insert(label.to_lowercase(), label);
            insert(label.trim().to_string(), label);
            insert(label.trim().to_lowercase(), label);
        }

        for (i, option) in options.iter().enumerate() {
            let label = option.label.as_str();
            insert((i + 1).to_string(), label);
            if i < LETTER_KEYS {
                // i < 26 keeps the offset within the alphabet
                let offset = i as u8;
                insert(char::from(b'A' + offset).to_string(), label);
                insert(char::from(b'a' + offset).to_string(), label);
            }
        }

        for option in options {
            insert(option.text.trim().to_lowercase(), &option.label);
        }

        Self { keys }
    }

    /// Resolve a raw label.
    ///
    /// Unknown labels come back unchanged; callers check the result against
    /// the question's options. Blank input yields `None`.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }
        let trimmed = raw.trim();
        let candidates = [
            raw.to_string(),
            raw.to_lowercase(),
            trimmed.to_string(),
            trimmed.to_lowercase(),
            strip_decoration(trimmed),
            strip_decoration(trimmed).to_lowercase(),
        ];
        let resolved = candidates
            .iter()
            .find_map(|key| self.keys.get(key))
            .cloned()
            .unwrap_or_else(|| raw.to_string());
        Some(resolved)
    }

    /// Resolve a raw label to one of the known canonical labels, if any
    pub fn resolve(&self, raw: &str, options: &[QuestionOption]) -> Option<String> {
        self.normalize(raw)
            .filter(|label| options.iter().any(|o| &o.label == label))
    }
}

/// "(B)", "B)", "B." and "Option B" style decorations
fn strip_decoration(label: &str) -> String {
    let label = label
        .strip_prefix("Option ")
        .or_else(|| label.strip_prefix("option "))
        .unwrap_or(label);
    label
        .trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']' | '.' | ':'))
        .trim()
        .to_string()
}
