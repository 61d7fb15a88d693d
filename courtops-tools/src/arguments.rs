//! Tool argument parsing and typed access.

use crate::error::ToolError;
use serde_json::{Map, Value};
use tracing::warn;

pub type ToolArgs = Map<String, Value>;

/// Parse the raw argument string a model emitted. Anything that is not a JSON
/// object degrades to an empty mapping; handlers validate required fields.
pub fn parse_arguments(raw: &str) -> ToolArgs {
    if raw.trim().is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!("Tool arguments are not an object ({}), using empty mapping", type_name(&other));
            Map::new()
        }
        Err(e) => {
            warn!("Malformed tool arguments, using empty mapping: {}", e);
            Map::new()
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Non-empty trimmed string argument.
pub fn opt_str(args: &ToolArgs, key: &str) -> Option<String> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub fn req_str(args: &ToolArgs, key: &'static str) -> Result<String, ToolError> {
    opt_str(args, key).ok_or(ToolError::MissingArgument(key))
}

/// Integer argument; numeric strings are accepted since models often quote ids.
pub fn req_i64(args: &ToolArgs, key: &'static str) -> Result<i64, ToolError> {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| ToolError::rejected(format!("Invalid integer for {}: {}", key, n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ToolError::rejected(format!("Invalid integer for {}: {}", key, s))),
        _ => Err(ToolError::MissingArgument(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_object() {
        let args = parse_arguments(r#"{"ticket_id": 12}"#);
        assert_eq!(args.get("ticket_id"), Some(&json!(12)));
    }

    #[test]
    fn test_parse_malformed_degrades_to_empty() {
        assert!(parse_arguments("{not json").is_empty());
        assert!(parse_arguments("[1,2]").is_empty());
        assert!(parse_arguments("").is_empty());
    }

    #[test]
    fn test_req_i64_accepts_quoted_ids() {
        let args = parse_arguments(r#"{"a": "42", "b": 7, "c": "x", "d": 3.0}"#);
        assert_eq!(req_i64(&args, "a").unwrap(), 42);
        assert_eq!(req_i64(&args, "b").unwrap(), 7);
        assert_eq!(req_i64(&args, "d").unwrap(), 3);
        assert!(matches!(req_i64(&args, "c"), Err(ToolError::Rejected(_))));
        assert!(matches!(req_i64(&args, "zz"), Err(ToolError::MissingArgument("zz"))));
    }

    #[test]
    fn test_blank_strings_are_missing() {
        let args = parse_arguments(r#"{"title": "   "}"#);
        assert!(matches!(req_str(&args, "title"), Err(ToolError::MissingArgument("title"))));
    }
}
