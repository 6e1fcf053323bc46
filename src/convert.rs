//! Conversion utilities between JSON and SQLite values.
//!
//! Statement parameters arrive as JSON scalars and are bound as SQLite
//! values; result columns travel back as JSON.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rusqlite::types::{Value as SqlValue, ValueRef};
use serde_json::{Number, Value as JsonValue};

use crate::error::{McpError, Result};

/// Convert a JSON scalar to a bindable SQLite value.
///
/// Booleans bind as `0`/`1`. Arrays and objects have no scalar form and are
/// rejected.
pub fn json_to_sql(json: &JsonValue) -> Result<SqlValue> {
    match json {
        JsonValue::Null => Ok(SqlValue::Null),
        JsonValue::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SqlValue::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(SqlValue::Real(f))
            } else {
                Err(McpError::InvalidArg {
                    name: "params".to_string(),
                    reason: format!("number out of range: {}", n),
                })
            }
        }
        JsonValue::String(s) => Ok(SqlValue::Text(s.clone())),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(McpError::InvalidArg {
            name: "params".to_string(),
            reason: "statement parameters must be scalars".to_string(),
        }),
    }
}

/// Convert a list of JSON scalars to statement parameters.
pub fn json_to_params(values: &[JsonValue]) -> Result<Vec<SqlValue>> {
    values.iter().map(json_to_sql).collect()
}

/// Convert a SQLite column value to JSON. Blobs become base64 strings.
pub fn sql_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        ValueRef::Text(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => JsonValue::String(BASE64.encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_to_sql() {
        assert_eq!(json_to_sql(&json!(null)).unwrap(), SqlValue::Null);
        assert_eq!(json_to_sql(&json!(true)).unwrap(), SqlValue::Integer(1));
        assert_eq!(json_to_sql(&json!(42)).unwrap(), SqlValue::Integer(42));
        assert_eq!(json_to_sql(&json!(1.5)).unwrap(), SqlValue::Real(1.5));
        assert_eq!(
            json_to_sql(&json!("hi")).unwrap(),
            SqlValue::Text("hi".to_string())
        );
    }

    #[test]
    fn test_composites_rejected() {
        let err = json_to_params(&[json!(1), json!([1, 2])]).unwrap_err();
        assert!(matches!(err, McpError::InvalidArg { .. }));
        assert!(json_to_sql(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_sql_to_json() {
        assert_eq!(sql_to_json(ValueRef::Null), json!(null));
        assert_eq!(sql_to_json(ValueRef::Integer(7)), json!(7));
        assert_eq!(sql_to_json(ValueRef::Real(0.25)), json!(0.25));
        assert_eq!(sql_to_json(ValueRef::Text(b"note")), json!("note"));
        assert_eq!(sql_to_json(ValueRef::Blob(b"abc")), json!("YWJj"));
    }
}
