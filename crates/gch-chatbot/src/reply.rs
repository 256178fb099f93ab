//! Reply extraction from the webhook's response body.
//!
//! The workflow answers in several shapes depending on which node produced
//! the output. Fields are tried in a fixed order:
//!
//! 1. an array: the first element's `output`, `response` or `message`
//! 2. an object: `output`, `response`, `message`, `text`
//! 3. the same fields under `data`
//! 4. a bare JSON string
//! 5. a body that is not JSON at all, taken as text

use serde_json::Value;

const ITEM_FIELDS: [&str; 3] = ["output", "response", "message"];
const OBJECT_FIELDS: [&str; 4] = ["output", "response", "message", "text"];

fn first_string<'a>(value: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
}

/// Pull the reply text out of a response body. `None` when nothing usable
/// was found.
pub fn extract_reply(body: &str) -> Option<String> {
    let raw = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items
            .first()
            .and_then(|item| first_string(item, &ITEM_FIELDS).or_else(|| item.as_str()))
            .map(str::to_string),
        Ok(value @ Value::Object(_)) => first_string(&value, &OBJECT_FIELDS)
            .or_else(|| {
                value
                    .get("data")
                    .and_then(|data| first_string(data, &OBJECT_FIELDS))
            })
            .map(str::to_string),
        Ok(Value::String(text)) => Some(text),
        Ok(_) => None,
        Err(_) => Some(body.to_string()),
    }?;

    let cleaned = clean_reply(&raw);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Trim, drop one pair of surrounding quotes and expand literal `\n`.
pub fn clean_reply(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.replace("\\n", "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_with_output() {
        assert_eq!(
            extract_reply(r#"[{"output":"Hola, ¿en qué te ayudo?"}]"#).as_deref(),
            Some("Hola, ¿en qué te ayudo?")
        );
    }

    #[test]
    fn test_array_field_order() {
        assert_eq!(
            extract_reply(r#"[{"message":"m","response":"r"}]"#).as_deref(),
            Some("r")
        );
    }

    #[test]
    fn test_object_fields() {
        assert_eq!(extract_reply(r#"{"response":"r"}"#).as_deref(), Some("r"));
        assert_eq!(extract_reply(r#"{"message":"m"}"#).as_deref(), Some("m"));
        assert_eq!(extract_reply(r#"{"text":"t"}"#).as_deref(), Some("t"));
        assert_eq!(
            extract_reply(r#"{"output":"o","text":"t"}"#).as_deref(),
            Some("o")
        );
    }

    #[test]
    fn test_nested_data() {
        assert_eq!(
            extract_reply(r#"{"data":{"text":"anidado"}}"#).as_deref(),
            Some("anidado")
        );
    }

    #[test]
    fn test_bare_string_and_plain_text() {
        assert_eq!(extract_reply(r#""solo texto""#).as_deref(), Some("solo texto"));
        assert_eq!(
            extract_reply("Respuesta sin JSON").as_deref(),
            Some("Respuesta sin JSON")
        );
    }

    #[test]
    fn test_unusable_shapes() {
        assert_eq!(extract_reply("[]"), None);
        assert_eq!(extract_reply(r#"{"status":"ok"}"#), None);
        assert_eq!(extract_reply("42"), None);
        assert_eq!(extract_reply(r#"{"output":"   "}"#), None);
        assert_eq!(extract_reply("   "), None);
    }

    #[test]
    fn test_clean_reply() {
        assert_eq!(clean_reply("  \"Hola\\nMundo\"  "), "Hola\nMundo");
        assert_eq!(clean_reply("sin comillas"), "sin comillas");
        assert_eq!(clean_reply("\""), "\"");
    }
}
