//! Lenient parsing of structured data embedded in free-text model output.
//!
//! The backend is not guaranteed to return pure JSON; it may wrap it in
//! prose or code fences. The fallback ladder is fixed: direct parse of the
//! trimmed response, then a parse of the substring between the first opening
//! bracket and the last matching closer, then the caller's declared default.

use regex::Regex;
use serde::de::DeserializeOwned;

/// Parse a JSON value out of a possibly prose-wrapped response. Returns
/// `None` when neither the full text nor the bracket slice parses; callers
/// substitute their own default.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let start = trimmed.find(['{', '['])?;
    let close = match trimmed[start..].chars().next() {
        Some('{') => '}',
        _ => ']',
    };
    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// Best-effort scrape of URL-shaped substrings from raw text. Used as the
/// last resort when a source list fails to parse as JSON.
pub fn extract_urls(raw: &str) -> Vec<String> {
    let Ok(re) = Regex::new(r#"https?://[^\s"'<>\)\]]+"#) else {
        return Vec::new();
    };
    re.find_iter(raw)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';']).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_direct_parse() {
        let parsed: Value = parse_json(r#"{"title": "T"}"#).unwrap();
        assert_eq!(parsed["title"], "T");
    }

    #[test]
    fn test_prose_wrapped_object_equals_direct_parse() {
        let embedded = r#"{"title": "T", "sections": [{"heading": "H"}]}"#;
        let wrapped = format!("Sure! Here is the outline you asked for:\n\n{embedded}\n\nLet me know if you need changes.");
        let lenient: Value = parse_json(&wrapped).unwrap();
        let direct: Value = serde_json::from_str(embedded).unwrap();
        assert_eq!(lenient, direct);
    }

    #[test]
    fn test_code_fenced_array() {
        let raw = "```json\n[{\"name\": \"a\", \"link\": \"https://a.example\"}]\n```";
        let parsed: Value = parse_json(raw).unwrap();
        assert!(parsed.is_array());
    }

    #[test]
    fn test_no_brackets_is_none() {
        assert!(parse_json::<Value>("no structure here at all").is_none());
    }

    #[test]
    fn test_garbage_slice_is_none() {
        assert!(parse_json::<Value>("start { not json at all } end").is_none());
    }

    #[test]
    fn test_extract_urls() {
        let raw = "See https://example.com/a and (https://b.example/path), done.";
        assert_eq!(
            extract_urls(raw),
            vec!["https://example.com/a", "https://b.example/path"]
        );
    }

    #[test]
    fn test_extract_urls_empty() {
        assert!(extract_urls("nothing to see").is_empty());
    }
}
