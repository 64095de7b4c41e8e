//! String utilities for the domain layer.

/// Shorten text for log output, keeping at most `max_chars` characters
/// and collapsing newlines so a preview stays on one line.
pub fn preview(s: &str, max_chars: usize) -> String {
    let flat: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let kept: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_unchanged() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("abcdefghij", 5), "abcd…");
        assert_eq!(preview("日本語テキスト", 4), "日本語…");
    }

    #[test]
    fn test_preview_flattens_newlines() {
        assert_eq!(preview("{\n\"a\": 1\n}", 40), "{ \"a\": 1 }");
    }
}
