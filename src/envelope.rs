//! The uniform result shape returned by every handler.
//!
//! On the wire an envelope is a JSON object that always carries `success`.
//! Successful envelopes add operation-specific fields (`data`, `count`,
//! `affected_rows`, ...); failures carry `error` and `error_kind` only.

use serde_json::{Map, Value as JsonValue};

use crate::error::{ErrorKind, McpError, Result};

/// Handler result: either a success payload or an error, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Operation succeeded; the map holds its fields.
    Success(Map<String, JsonValue>),
    /// Operation failed.
    Failure {
        /// Error category
        kind: ErrorKind,
        /// Human-readable message
        error: String,
    },
}

impl Envelope {
    /// Empty success envelope; attach fields with [`Envelope::with`].
    pub fn success() -> Self {
        Envelope::Success(Map::new())
    }

    /// Failure envelope.
    pub fn failure(kind: ErrorKind, error: impl Into<String>) -> Self {
        Envelope::Failure {
            kind,
            error: error.into(),
        }
    }

    /// Failure envelope describing `err`.
    pub fn from_error(err: &McpError) -> Self {
        Self::failure(err.kind(), err.to_string())
    }

    /// Collapse a fallible handler result into an envelope.
    pub fn from_result(result: Result<Envelope>) -> Self {
        result.unwrap_or_else(|err| Self::from_error(&err))
    }

    /// Add a field to a success envelope. Failures are returned unchanged.
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        if let Envelope::Success(fields) = &mut self {
            fields.insert(key.to_string(), value.into());
        }
        self
    }

    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    /// Field of a success envelope.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        match self {
            Envelope::Success(fields) => fields.get(key),
            Envelope::Failure { .. } => None,
        }
    }

    /// Error message of a failure envelope.
    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Failure { error, .. } => Some(error),
            Envelope::Success(_) => None,
        }
    }

    /// Error kind of a failure envelope.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Envelope::Failure { kind, .. } => Some(*kind),
            Envelope::Success(_) => None,
        }
    }

    /// JSON object form.
    pub fn to_json(&self) -> JsonValue {
        let mut obj = Map::new();
        match self {
            Envelope::Success(fields) => {
                obj.insert("success".to_string(), JsonValue::Bool(true));
                for (key, value) in fields {
                    if key != "success" {
                        obj.insert(key.clone(), value.clone());
                    }
                }
            }
            Envelope::Failure { kind, error } => {
                obj.insert("success".to_string(), JsonValue::Bool(false));
                obj.insert("error".to_string(), JsonValue::String(error.clone()));
                obj.insert(
                    "error_kind".to_string(),
                    JsonValue::String(kind.as_str().to_string()),
                );
            }
        }
        JsonValue::Object(obj)
    }

    /// Serialized text form handed to the protocol layer.
    pub fn to_wire(&self) -> String {
        self.to_json().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_carries_fields() {
        let env = Envelope::success()
            .with("count", 2)
            .with("data", vec![json!(1), json!(2)]);
        assert!(env.is_success());
        assert_eq!(
            env.to_json(),
            json!({"success": true, "count": 2, "data": [1, 2]})
        );
        assert_eq!(env.error(), None);
    }

    #[test]
    fn test_failure_shape() {
        let env = Envelope::failure(ErrorKind::NotFoundError, "unknown tool: x");
        assert_eq!(
            env.to_json(),
            json!({"success": false, "error": "unknown tool: x", "error_kind": "not_found_error"})
        );
        assert_eq!(env.kind(), Some(ErrorKind::NotFoundError));
    }

    #[test]
    fn test_success_flag_cannot_be_overridden() {
        let env = Envelope::success().with("success", false);
        assert_eq!(env.to_json()["success"], json!(true));
    }

    #[test]
    fn test_with_ignored_on_failure() {
        let env = Envelope::failure(ErrorKind::ExecutionError, "boom").with("count", 1);
        assert_eq!(env.get("count"), None);
        assert!(!env.to_wire().contains("count"));
    }

    #[test]
    fn test_from_result() {
        let env = Envelope::from_result(Err(McpError::MissingArg("title".into())));
        assert_eq!(env.kind(), Some(ErrorKind::ArgumentError));
        assert_eq!(env.error(), Some("missing required argument: title"));
    }
}
