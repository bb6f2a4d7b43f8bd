//! Shared utility functions for model output extraction and text handling.
//!
//! ## JSON Extraction Helpers
//!
//! Models return loosely-typed JSON. These helpers read fields without
//! failing the whole response when one field has the wrong shape:
//! - `json_string`, `json_string_or` - Extract strings
//! - `json_string_array` - Extract string arrays, skipping non-strings
//! - `json_bool`, `json_percent` - Extract primitives

use serde_json::Value;

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract a trimmed, non-empty string from a JSON object by key.
#[inline]
pub fn json_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extract string with default value.
#[inline]
pub fn json_string_or(value: &Value, key: &str, default: &str) -> String {
    json_string(value, key).unwrap_or_else(|| default.to_string())
}

/// Extract string array by key; blank and non-string entries are dropped.
pub fn json_string_array(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Extract boolean with default. Accepts `"true"`/`"false"` strings as well.
pub fn json_bool(value: &Value, key: &str, default: bool) -> bool {
    match value.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => true,
            "false" | "no" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Extract a 0-100 score, clamping out-of-range numbers.
pub fn json_percent(value: &Value, key: &str) -> u8 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .map(|n| n.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0)
}

// =============================================================================
// Text Utilities
// =============================================================================

/// Count whitespace-separated words, ignoring markdown heading markers and bullets.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| !w.chars().all(|c| matches!(c, '#' | '-' | '*')))
        .count()
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Lowercase, hyphen-separated file-safe form of a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "article".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_string_helpers() {
        let value = json!({"title": "  Coffee  ", "blank": " ", "num": 3});
        assert_eq!(json_string(&value, "title").as_deref(), Some("Coffee"));
        assert_eq!(json_string(&value, "blank"), None);
        assert_eq!(json_string(&value, "num"), None);
        assert_eq!(json_string_or(&value, "missing", "x"), "x");
    }

    #[test]
    fn test_json_string_array_skips_junk() {
        let value = json!({"tags": ["a", "", 3, " b "]});
        assert_eq!(json_string_array(&value, "tags"), vec!["a", "b"]);
        assert!(json_string_array(&value, "missing").is_empty());
    }

    #[test]
    fn test_json_bool_accepts_strings() {
        let value = json!({"a": true, "b": "false", "c": "maybe"});
        assert!(json_bool(&value, "a", false));
        assert!(!json_bool(&value, "b", true));
        assert!(json_bool(&value, "c", true));
    }

    #[test]
    fn test_json_percent_clamps() {
        let value = json!({"hi": 140, "lo": -3, "mid": 72.6});
        assert_eq!(json_percent(&value, "hi"), 100);
        assert_eq!(json_percent(&value, "lo"), 0);
        assert_eq!(json_percent(&value, "mid"), 73);
        assert_eq!(json_percent(&value, "missing"), 0);
    }

    #[test]
    fn test_word_count_ignores_markup() {
        assert_eq!(word_count("## History\n\n- Coffee is a drink"), 5);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("café au lait", 4), "café");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Ada Lovelace"), "ada-lovelace");
        assert_eq!(slugify("  Battle of Hastings (1066)! "), "battle-of-hastings-1066");
        assert_eq!(slugify("!!!"), "article");
    }
}
