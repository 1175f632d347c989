//! Extraction of structured JSON from free-form backend output.
//!
//! Backends return opaque text. Three extraction tiers run in order: a fenced
//! ```json block, any fenced code block, then the first balanced JSON object in
//! the text. When all tiers fail the raw text is wrapped as a structured 500
//! payload with a truncated excerpt for diagnostics.

use serde_json::Value;

/// Longest raw-text excerpt carried in a parse-failure payload.
const RAW_EXCERPT_LEN: usize = 200;

/// Parse backend text into a response envelope, falling back to a wrapped
/// error payload when no JSON object can be extracted.
pub fn parse_generated_text(text: &str) -> Value {
    if let Some(value) = extract_json(text) {
        return value;
    }

    let excerpt: String = text.chars().take(RAW_EXCERPT_LEN).collect();
    serde_json::json!({
        "status_code": 500,
        "headers": {"Content-Type": "application/json"},
        "body": {
            "error": "Failed to parse AI response",
            "raw_response": excerpt,
        }
    })
}

/// Run the extraction tiers, returning the first JSON object that parses.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Some(value) = fenced_block(text, "```json") {
        return Some(value);
    }
    if let Some(value) = fenced_block(text, "```") {
        return Some(value);
    }
    balanced_object(text)
}

/// Parse the contents of the first fenced block opened by `fence`.
fn fenced_block(text: &str, fence: &str) -> Option<Value> {
    let start = text.find(fence)? + fence.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    let candidate = rest[..end].trim();
    serde_json::from_str(candidate).ok()
}

/// Find the first balanced `{...}` span and parse it.
///
/// Tracks string literals and escapes so braces inside strings do not count.
fn balanced_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..start + offset + 1];
                    return serde_json::from_str(candidate).ok();
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
    fn test_raw_json_passes_through() {
        let value = extract_json(r#"{"status_code": 200, "body": {"id": 1}}"#).unwrap();
        assert_eq!(value["status_code"], json!(200));
    }

    #[test]
    fn test_json_fence() {
        let text = "Here you go:\n```json\n{\"status_code\": 201, \"body\": {}}\n```\nDone.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["status_code"], json!(201));
    }

    #[test]
    fn test_bare_fence() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), Some(json!({"a": 1})));
    }

    #[test]
    fn test_embedded_object() {
        let text = "The response is {\"a\": {\"b\": 2}} as requested.";
        assert_eq!(extract_json(text), Some(json!({"a": {"b": 2}})));
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let text = r#"prefix {"msg": "unbalanced } brace", "n": 1} suffix"#;
        let value = extract_json(text).unwrap();
        assert_eq!(value["n"], json!(1));
    }

    #[test]
    fn test_unparseable_text_wraps_excerpt() {
        let value = parse_generated_text("I cannot help with that.");
        assert_eq!(value["status_code"], json!(500));
        assert_eq!(
            value["body"]["raw_response"],
            json!("I cannot help with that.")
        );
    }

    #[test]
    fn test_excerpt_is_truncated() {
        let long = "x".repeat(500);
        let value = parse_generated_text(&long);
        assert_eq!(
            value["body"]["raw_response"].as_str().unwrap().len(),
            RAW_EXCERPT_LEN
        );
    }
}
