//! Render input properties.

use serde_json::{Map, Value};

/// Flat mapping of input properties spread onto the root component.
pub type Props = Map<String, Value>;

/// Errors produced while reading props from JSON text.
#[derive(Debug, thiserror::Error)]
pub enum PropsError {
    #[error("props are not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("props must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Parse a props mapping from a JSON document.
///
/// Scalars and arrays are rejected: props must be spreadable as named inputs.
pub fn props_from_json(json: &str) -> Result<Props, PropsError> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map),
        other => Err(PropsError::NotAnObject(json_kind(&other))),
    }
}

/// Human-readable name of a JSON value's kind.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_from_json_object() {
        let props = props_from_json(r#"{"msg": "Hello", "count": 2}"#).unwrap();

        assert_eq!(props.get("msg"), Some(&Value::from("Hello")));
        assert_eq!(props.get("count"), Some(&Value::from(2)));
    }

    #[test]
    fn test_props_from_json_rejects_array() {
        let err = props_from_json("[1, 2]").unwrap_err();

        assert!(matches!(err, PropsError::NotAnObject("an array")));
        assert_eq!(err.to_string(), "props must be a JSON object, got an array");
    }

    #[test]
    fn test_props_from_json_rejects_garbage() {
        assert!(matches!(
            props_from_json("{msg:"),
            Err(PropsError::Syntax(_))
        ));
    }
}
