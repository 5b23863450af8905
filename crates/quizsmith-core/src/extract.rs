//! JSON extraction from free-form AI responses.
//!
//! Models wrap their JSON in prose, markdown fences, or both. Extraction
//! tries an ordered list of strategies and keeps the first strict parse that
//! succeeds:
//!
//! 1. the whole text
//! 2. the contents of a fenced code block (optionally tagged `json`)
//! 3. the span from the first `{` to the last `}`

use serde_json::Value;

use crate::error::ExtractError;

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("whole", parse_whole),
    ("fenced", parse_fenced),
    ("braces", parse_braces),
];

/// Recover a JSON value from arbitrary response text.
pub fn extract_json(text: &str) -> Result<Value, ExtractError> {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(text) {
            tracing::debug!(strategy = name, "extracted JSON from AI response");
            return Ok(value);
        }
    }
    Err(ExtractError::NoJsonFound)
}

fn parse_whole(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok()
}

/// Try each fenced block in order of appearance.
fn parse_fenced(text: &str) -> Option<Value> {
    const FENCE: &str = "```";

    let mut rest = text;
    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let close = after_open.find(FENCE)?;
        let body = strip_json_tag(&after_open[..close]);
        if let Ok(value) = serde_json::from_str(body.trim()) {
            return Some(value);
        }
        rest = &after_open[close + FENCE.len()..];
    }
    None
}

fn strip_json_tag(body: &str) -> &str {
    match body.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
        _ => body,
    }
}

fn parse_braces(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Leading part of a raw response, cut on a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_text_is_json() {
        let value = extract_json("  {\"title\": \"Rust\"}\n").unwrap();
        assert_eq!(value, json!({"title": "Rust"}));
    }

    #[test]
    fn fenced_block_inline() {
        let value = extract_json("noise ```json {\"a\":1} ``` trailer").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn fenced_block_multiline_untagged() {
        let input = "Here you go:\n\n```\n{\"questions\": []}\n```\nEnjoy!";
        assert_eq!(extract_json(input).unwrap(), json!({"questions": []}));
    }

    #[test]
    fn fenced_tag_is_case_insensitive() {
        let input = "```JSON\n{\"a\": true}\n```";
        assert_eq!(extract_json(input).unwrap(), json!({"a": true}));
    }

    #[test]
    fn skips_unparseable_fence_for_later_one() {
        let input = "```rust\nfn main() {}\n```\nand\n```json\n{\"b\": 2}\n```";
        assert_eq!(extract_json(input).unwrap(), json!({"b": 2}));
    }

    #[test]
    fn brace_span_fallback() {
        let input = "Sure! {\"title\": \"T\", \"questions\": [{\"q\": \"x\"}]} Hope this helps.";
        let value = extract_json(input).unwrap();
        assert_eq!(value["title"], "T");
    }

    #[test]
    fn unclosed_fence_falls_through_to_braces() {
        let input = "```json\n{\"a\": 1}";
        assert_eq!(extract_json(input).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn no_json_found() {
        assert_eq!(
            extract_json("I cannot help with that request."),
            Err(ExtractError::NoJsonFound)
        );
        assert_eq!(extract_json("} backwards {"), Err(ExtractError::NoJsonFound));
        assert_eq!(extract_json(""), Err(ExtractError::NoJsonFound));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo wörld", 4), "héll");
        assert_eq!(excerpt("ab", 10), "ab");
    }
}
