//! JSON recovery from model replies.
//!
//! Recovery is a short chain of pure strategies tried in order; the first
//! one that yields a value of the requested [`JsonShape`] wins:
//!
//! 1. the whole reply, trimmed
//! 2. the reply with `<think>…</think>` blocks removed
//! 3. the first balanced `{…}` (or `[…]`) region of the cleaned reply,
//!    by position of its opening delimiter
//! 4. the cleaned reply with markdown code fences removed

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::trace;

static THINKING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<think(?:ing)?>.*?</think(?:ing)?>").expect("thinking block pattern is valid")
});

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?\s*").expect("code fence pattern is valid"));

/// Which JSON values count as a successful recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// A JSON object (a single answer)
    Object,
    /// A JSON array
    Array,
    /// Either an array or an object (a question list, possibly unwrapped)
    ObjectOrArray,
}

impl JsonShape {
    fn accepts(self, value: &Value) -> bool {
        match self {
            JsonShape::Object => value.is_object(),
            JsonShape::Array => value.is_array(),
            JsonShape::ObjectOrArray => value.is_object() || value.is_array(),
        }
    }

    fn delimiters(self) -> &'static [(char, char)] {
        match self {
            JsonShape::Object => &[('{', '}')],
            JsonShape::Array => &[('[', ']')],
            JsonShape::ObjectOrArray => &[('{', '}'), ('[', ']')],
        }
    }
}

type Strategy = fn(&str, JsonShape) -> Option<Value>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("direct", parse_direct),
    ("without_thinking", parse_without_thinking),
    ("embedded", parse_embedded),
    ("unfenced", parse_unfenced),
];

/// Recover a JSON value of the given shape from a model reply.
///
/// Returns `None` when every strategy fails; never panics.
pub fn repair_json(text: &str, shape: JsonShape) -> Option<Value> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let value = strategy(text, shape)?;
        trace!(strategy = *name, "Recovered JSON from model reply");
        Some(value)
    })
}

/// Remove reasoning blocks emitted by thinking models
pub fn strip_thinking(text: &str) -> String {
    THINKING_BLOCK.replace_all(text, "").trim().to_string()
}

fn parse_as(candidate: &str, shape: JsonShape) -> Option<Value> {
    let value = serde_json::from_str::<Value>(candidate.trim()).ok()?;
    shape.accepts(&value).then_some(value)
}

fn parse_direct(text: &str, shape: JsonShape) -> Option<Value> {
    parse_as(text, shape)
}

fn parse_without_thinking(text: &str, shape: JsonShape) -> Option<Value> {
    parse_as(&strip_thinking(text), shape)
}

fn parse_embedded(text: &str, shape: JsonShape) -> Option<Value> {
    let cleaned = strip_thinking(text);
    balanced_regions(&cleaned, shape.delimiters()).find_map(|region| parse_as(region, shape))
}

fn parse_unfenced(text: &str, shape: JsonShape) -> Option<Value> {
    let cleaned = strip_thinking(text);
    parse_as(&CODE_FENCE.replace_all(&cleaned, ""), shape)
}

/// Iterate over balanced regions of any of `delimiters`, in order of where
/// they open, so an outer value always comes before the values it contains.
/// Delimiters inside JSON strings are ignored.
fn balanced_regions<'a>(
    text: &'a str,
    delimiters: &'static [(char, char)],
) -> impl Iterator<Item = &'a str> {
    text.char_indices().filter_map(move |(start, c)| {
        let &(open, close) = delimiters.iter().find(|&&(open, _)| open == c)?;
        balanced_end(&text[start..], open, close).map(|len| &text[start..start + len])
    })
}

/// Byte length of the balanced region at the start of `text`, if it closes.
fn balanced_end(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_object() {
        let value = repair_json(r#"  {"a": 1}  "#, JsonShape::Object).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_shape_mismatch_is_not_accepted() {
        assert!(repair_json("[1, 2]", JsonShape::Object).is_none());
        assert!(repair_json("42", JsonShape::ObjectOrArray).is_none());
    }

    #[test]
    fn test_thinking_block_removed() {
        let text = "<think>Option {B} looks right</think>\n{\"a\": 2}";
        assert_eq!(repair_json(text, JsonShape::Object), Some(json!({"a": 2})));
    }

    #[test]
    fn test_embedded_object_in_prose() {
        let text = r#"Here's the answer: {"a": {"b": "}"}} hope it helps"#;
        assert_eq!(
            repair_json(text, JsonShape::Object),
            Some(json!({"a": {"b": "}"}}))
        );
    }

    #[test]
    fn test_embedded_skips_unparseable_region() {
        let text = r#"Consider {A, B}. Final: {"a": 3}"#;
        assert_eq!(repair_json(text, JsonShape::Object), Some(json!({"a": 3})));
    }

    #[test]
    fn test_fenced_array() {
        let text = "```json\n[{\"id\": \"1\"}]\n```";
        assert_eq!(
            repair_json(text, JsonShape::ObjectOrArray),
            Some(json!([{"id": "1"}]))
        );
    }

    #[test]
    fn test_fenced_object_with_escaped_quotes() {
        let text = "```JSON\n{\"a\": \"say \\\"hi\\\"\"}\n```";
        assert_eq!(
            repair_json(text, JsonShape::Object),
            Some(json!({"a": "say \"hi\""}))
        );
    }

    #[test]
    fn test_nothing_recoverable() {
        assert!(repair_json("I think the answer is B.", JsonShape::Object).is_none());
        assert!(repair_json("", JsonShape::Object).is_none());
        assert!(repair_json("{unclosed", JsonShape::Object).is_none());
    }

    #[test]
    fn test_outer_object_wins_over_inner_array() {
        let text = r#"Sure: {"q": "?", "options": ["x", "y"]} done"#;
        assert_eq!(
            repair_json(text, JsonShape::ObjectOrArray),
            Some(json!({"q": "?", "options": ["x", "y"]}))
        );

        let text = r#"Result: [{"q": "?"}]"#;
        assert_eq!(
            repair_json(text, JsonShape::ObjectOrArray),
            Some(json!([{"q": "?"}]))
        );
    }

    #[test]
    fn test_balanced_end_ignores_strings() {
        assert_eq!(balanced_end(r#"{"x": "{"}"#, '{', '}'), Some(10));
        assert_eq!(balanced_end("{{}", '{', '}'), None);
    }
}
