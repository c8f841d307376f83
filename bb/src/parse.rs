//! Lenient structured-output parsing
//!
//! Model responses are free text that should contain JSON but often
//! arrives wrapped in prose or markdown fences. This module locates the
//! first balanced `{...}` or `[...]` substring (string- and escape-aware)
//! and deserializes it into the expected shape. Every stage reduces a
//! `ParseError` to its deterministic fallback value, so parse failures
//! never propagate outward.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Failure to locate or decode structured output
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON value found in model output")]
    NotFound,

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Extract the first balanced JSON object or array from free text
///
/// Tracks string literals and escapes so braces inside strings do not
/// confuse the delimiter matching. Returns `None` when no balanced
/// value exists.
pub fn extract_first_json(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;

    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    debug!("extract_first_json: mismatched delimiter");
                    return None;
                }
                if stack.is_empty() {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    debug!("extract_first_json: unbalanced input");
    None
}

/// Parse model output into a typed value, leniently
///
/// Tries the whole (trimmed) text first, then the first balanced JSON
/// substring.
pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> Result<T, ParseError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    let candidate = extract_first_json(trimmed).ok_or(ParseError::NotFound)?;
    Ok(serde_json::from_str(candidate)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_extract_plain_object() {
        let text = r#"{"a": 1}"#;
        assert_eq!(extract_first_json(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_extract_object_in_prose() {
        let text = r#"Sure! Here you go: {"a": [1, 2]} hope that helps."#;
        assert_eq!(extract_first_json(text), Some(r#"{"a": [1, 2]}"#));
    }

    #[test]
    fn test_extract_array_in_markdown_fence() {
        let text = "```json\n[{\"id\": \"x\"}]\n```";
        assert_eq!(extract_first_json(text), Some("[{\"id\": \"x\"}]"));
    }

    #[test]
    fn test_extract_braces_inside_strings() {
        let text = r#"noise {"msg": "look: } and ] inside", "n": 1} tail"#;
        assert_eq!(
            extract_first_json(text),
            Some(r#"{"msg": "look: } and ] inside", "n": 1}"#)
        );
    }

    #[test]
    fn test_extract_escaped_quote_in_string() {
        let text = r#"{"msg": "she said \"hi\""}"#;
        assert_eq!(extract_first_json(text), Some(text));
    }

    #[test]
    fn test_extract_unbalanced_returns_none() {
        assert_eq!(extract_first_json(r#"{"a": 1"#), None);
        assert_eq!(extract_first_json("no json here"), None);
    }

    #[test]
    fn test_extract_mismatched_returns_none() {
        assert_eq!(extract_first_json(r#"{"a": 1]"#), None);
    }

    #[test]
    fn test_parse_lenient_typed() {
        let text = r#"The record is {"name": "widget", "count": 3} as requested."#;
        let sample: Sample = parse_lenient(text).unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "widget".to_string(),
                count: 3
            }
        );
    }

    #[test]
    fn test_parse_lenient_whole_text_first() {
        let sample: Sample = parse_lenient(r#"  {"name": "x", "count": 0}  "#).unwrap();
        assert_eq!(sample.name, "x");
    }

    #[test]
    fn test_parse_lenient_wrong_shape_errors() {
        let result: Result<Sample, _> = parse_lenient(r#"{"name": "x"}"#);
        assert!(matches!(result, Err(ParseError::Json(_))));
    }

    #[test]
    fn test_parse_lenient_no_json_errors() {
        let result: Result<Sample, _> = parse_lenient("nothing structured at all");
        assert!(matches!(result, Err(ParseError::NotFound)));
    }

    #[test]
    fn test_parse_lenient_deterministic_on_failure() {
        // Same malformed input fails identically both times
        let a: Result<Sample, _> = parse_lenient("oops {");
        let b: Result<Sample, _> = parse_lenient("oops {");
        assert!(a.is_err() && b.is_err());
    }

    proptest! {
        #[test]
        fn prop_extract_never_panics(text in ".*") {
            let _ = extract_first_json(&text);
        }

        #[test]
        fn prop_extracted_slice_is_delimited(text in ".*") {
            if let Some(slice) = extract_first_json(&text) {
                let first = slice.as_bytes()[0];
                let last = slice.as_bytes()[slice.len() - 1];
                prop_assert!(first == b'{' || first == b'[', "first byte was {:?}", first as char);
                prop_assert!(last == b'}' || last == b']', "last byte was {:?}", last as char);
            }
        }

        #[test]
        fn prop_valid_json_in_noise_is_found(prefix in "[a-z .!]*", n in 0u32..1000) {
            let text = format!("{}{{\"count\": {}}}", prefix, n);
            let slice = extract_first_json(&text).unwrap();
            let value: serde_json::Value = serde_json::from_str(slice).unwrap();
            prop_assert_eq!(value["count"].as_u64().unwrap() as u32, n);
        }
    }
}
