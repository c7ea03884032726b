//! The declarative tool input validator: a JSON-Schema subset (spec §4.4).
//!
//! Tool schemas are plain `serde_json::Value` JSON Schema documents (built
//! with `serde_json::json!`, same as the teacher's `ToolDefinition::input_schema`).
//! This module is the runtime validator the teacher never needed (its tools
//! trusted `serde::Deserialize` to reject bad shapes); it walks a schema
//! document against an argument value and collects every failure in one
//! pass, rather than stopping at the first.

use serde_json::Value;

/// One validation failure: the dotted/bracketed JSON path to the offending
/// value, and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub path: String,
    pub message: String,
}

impl ValidationFailure {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validate `instance` against `schema`, returning every failure found. An
/// empty vector means the instance is valid.
pub fn validate(schema: &Value, instance: &Value) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    walk(schema, instance, "$", &mut failures);
    failures
}

fn walk(schema: &Value, instance: &Value, path: &str, out: &mut Vec<ValidationFailure>) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(ty) = schema.get("type").and_then(Value::as_str) {
        if !matches_type(ty, instance) {
            out.push(ValidationFailure::new(
                path,
                format!("must be of type {ty}, got {}", type_name(instance)),
            ));
            // Further constraints are meaningless against a shape mismatch.
            return;
        }
    }

    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        if !values.iter().any(|v| v == instance) {
            out.push(ValidationFailure::new(path, format!("must be one of {values:?}")));
        }
    }

    match instance {
        Value::String(s) => validate_string(schema, s, path, out),
        Value::Number(_) => validate_number(schema, instance, path, out),
        Value::Array(items) => validate_array(schema, items, path, out),
        Value::Object(_) => validate_object(schema, instance, path, out),
        _ => {}
    }
}

fn matches_type(ty: &str, instance: &Value) -> bool {
    match ty {
        "string" => instance.is_string(),
        "boolean" => instance.is_boolean(),
        "number" => instance.is_number(),
        "integer" => instance.as_f64().is_some_and(|n| n.fract() == 0.0) && instance.is_number(),
        "array" => instance.is_array(),
        "object" => instance.is_object(),
        "null" => instance.is_null(),
        _ => true,
    }
}

fn type_name(instance: &Value) -> &'static str {
    match instance {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn validate_string(
    schema: &serde_json::Map<String, Value>,
    s: &str,
    path: &str,
    out: &mut Vec<ValidationFailure>,
) {
    let grapheme_len = {
        use unicode_segmentation::UnicodeSegmentation;
        s.graphemes(true).count()
    };

    if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
        if grapheme_len < min as usize {
            out.push(ValidationFailure::new(path, format!("length must be at least {min}")));
        }
    }
    if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
        if grapheme_len > max as usize {
            out.push(ValidationFailure::new(path, format!("length must be at most {max}")));
        }
    }
    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        match regex::Regex::new(pattern) {
            Ok(re) if !re.is_match(s) => {
                out.push(ValidationFailure::new(path, format!("must match pattern {pattern}")));
            }
            Err(e) => out.push(ValidationFailure::new(path, format!("invalid pattern {pattern}: {e}"))),
            _ => {}
        }
    }
    if let Some(format) = schema.get("format").and_then(Value::as_str) {
        if let Err(msg) = validate_format(format, s) {
            out.push(ValidationFailure::new(path, msg));
        }
    }
}

fn validate_format(format: &str, s: &str) -> Result<(), String> {
    match format {
        "email" => {
            if !s.contains('@') || s.starts_with('@') || s.ends_with('@') || s.contains(' ') {
                return Err("must be a valid email address".to_string());
            }
            Ok(())
        }
        "uri" => url::Url::parse(s).map(|_| ()).map_err(|e| format!("must be a valid URI: {e}")),
        "date" => validate_date(s),
        "date-time" => chrono::DateTime::parse_from_rfc3339(s)
            .map(|_| ())
            .map_err(|e| format!("must be a valid RFC 3339 date-time: {e}")),
        _ => Ok(()),
    }
}

fn validate_date(s: &str) -> Result<(), String> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| "must be a valid YYYY-MM-DD date".to_string())
}

fn validate_number(
    schema: &serde_json::Map<String, Value>,
    instance: &Value,
    path: &str,
    out: &mut Vec<ValidationFailure>,
) {
    let Some(n) = instance.as_f64() else { return };

    if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
        if n < min {
            out.push(ValidationFailure::new(path, format!("must be >= {min}")));
        }
    }
    if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
        if n > max {
            out.push(ValidationFailure::new(path, format!("must be <= {max}")));
        }
    }
}

fn validate_array(
    schema: &serde_json::Map<String, Value>,
    items: &[Value],
    path: &str,
    out: &mut Vec<ValidationFailure>,
) {
    if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
        if items.len() < min as usize {
            out.push(ValidationFailure::new(path, format!("must have at least {min} items")));
        }
    }
    if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
        if items.len() > max as usize {
            out.push(ValidationFailure::new(path, format!("must have at most {max} items")));
        }
    }
    if let Some(item_schema) = schema.get("items") {
        for (i, item) in items.iter().enumerate() {
            walk(item_schema, item, &format!("{path}[{i}]"), out);
        }
    }
}

fn validate_object(
    schema: &serde_json::Map<String, Value>,
    instance: &Value,
    path: &str,
    out: &mut Vec<ValidationFailure>,
) {
    let obj = instance.as_object().expect("caller checked Value::Object");

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required {
            if let Some(name) = field.as_str() {
                if !obj.contains_key(name) {
                    out.push(ValidationFailure::new(format!("{path}.{name}"), "is required".to_string()));
                }
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (name, prop_schema) in properties {
            if let Some(value) = obj.get(name) {
                walk(prop_schema, value, &format!("{path}.{name}"), out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_all_failures_for_one_call() {
        let schema = json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "minLength": 1, "maxLength": 5},
                "year": {"type": "integer", "minimum": 1888},
            },
            "required": ["title", "year"],
        });
        let instance = json!({"title": "toolong", "year": 1.5});
        let failures = validate(&schema, &instance);
        assert_eq!(failures.len(), 2, "{failures:?}");
    }

    #[test]
    fn integer_rejects_fractional_even_when_whole_value_differs() {
        let schema = json!({"type": "integer"});
        assert!(validate(&schema, &json!(25.0)).is_empty());
        assert!(!validate(&schema, &json!(25.5)).is_empty());
    }

    #[test]
    fn boolean_does_not_accept_zero_one_or_string() {
        let schema = json!({"type": "boolean"});
        assert!(!validate(&schema, &json!(1)).is_empty());
        assert!(!validate(&schema, &json!("true")).is_empty());
        assert!(validate(&schema, &json!(true)).is_empty());
    }

    #[test]
    fn enum_comparison_is_case_sensitive() {
        let schema = json!({"type": "string", "enum": ["Action", "Drama"]});
        assert!(validate(&schema, &json!("Action")).is_empty());
        assert!(!validate(&schema, &json!("action")).is_empty());
    }

    #[test]
    fn date_format_requires_calendar_validity() {
        let schema = json!({"type": "string", "format": "date"});
        assert!(validate(&schema, &json!("2020-02-29")).is_empty());
        assert!(!validate(&schema, &json!("2021-02-29")).is_empty());
        assert!(!validate(&schema, &json!("not-a-date")).is_empty());
    }

    #[test]
    fn date_time_format_requires_rfc3339() {
        let schema = json!({"type": "string", "format": "date-time"});
        assert!(validate(&schema, &json!("2024-01-01T00:00:00Z")).is_empty());
        assert!(!validate(&schema, &json!("2024-01-01")).is_empty());
    }

    #[test]
    fn pattern_constraint_uses_regex_crate_syntax() {
        let schema = json!({"type": "string", "pattern": "^[A-Z][a-z]+$"});
        assert!(validate(&schema, &json!("Hello")).is_empty());
        assert!(!validate(&schema, &json!("hello")).is_empty());
    }

    #[test]
    fn nested_array_items_are_validated_recursively() {
        let schema = json!({
            "type": "array",
            "items": {"type": "string", "minLength": 1},
            "maxItems": 2,
        });
        let failures = validate(&schema, &json!(["", "ok", "extra"]));
        assert!(failures.iter().any(|f| f.path == "$[0]"));
        assert!(failures.iter().any(|f| f.message.contains("at most 2")));
    }
}
