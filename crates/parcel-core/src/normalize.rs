//! Helpers for mapping provider JSON onto canonical events
//!
//! Provider payloads are loosely typed: a field may be missing, null, a
//! string or a number. These helpers give every adapter the same answer.

use serde_json::Value;

/// Render a JSON scalar as text; anything else becomes empty
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Text of `value`, or `fallback` when it is empty
pub fn text_or(value: &Value, fallback: &str) -> String {
    Some(text(value))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_handles_scalars_and_missing_fields() {
        let doc = json!({"s": "Paris", "n": 42, "b": true, "z": null, "o": {"k": 1}});
        assert_eq!(text(&doc["s"]), "Paris");
        assert_eq!(text(&doc["n"]), "42");
        assert_eq!(text(&doc["b"]), "true");
        assert_eq!(text(&doc["z"]), "");
        assert_eq!(text(&doc["o"]), "");
        assert_eq!(text(&doc["absent"]), "");
    }

    #[test]
    fn text_or_falls_back_on_empty() {
        let doc = json!({"a": "", "b": "Delivered"});
        assert_eq!(text_or(&doc["a"], "Unknown"), "Unknown");
        assert_eq!(text_or(&doc["missing"], "Unknown"), "Unknown");
        assert_eq!(text_or(&doc["b"], "Unknown"), "Delivered");
    }
}
