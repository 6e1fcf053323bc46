//! Declared operation parameters and argument binding.

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

/// JSON type a parameter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// JSON string
    String,
    /// JSON integer
    Integer,
    /// JSON array
    Array,
}

impl ParamType {
    fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Array => value.is_array(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Array => "array",
        }
    }

    /// JSON Schema fragment for this type.
    pub fn schema(&self) -> JsonValue {
        serde_json::json!({ "type": self.name() })
    }
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Accepted JSON type
    pub kind: ParamType,
    /// Human-readable description
    pub description: String,
    /// Whether callers must supply it
    pub required: bool,
    /// Value substituted when the caller omits it
    pub default: Option<JsonValue>,
}

impl ParamSpec {
    /// A parameter the caller must supply.
    pub fn required(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    /// A parameter that may be omitted and has no default.
    pub fn optional(name: &str, kind: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// A parameter that falls back to `default` when omitted.
    pub fn with_default(
        name: &str,
        kind: ParamType,
        description: &str,
        default: impl Into<JsonValue>,
    ) -> Self {
        Self {
            required: false,
            default: Some(default.into()),
            ..Self::required(name, kind, description)
        }
    }
}

/// JSON Schema object describing `params`, for `tools/list`.
pub fn input_schema(params: &[ParamSpec]) -> JsonValue {
    let mut props = Map::new();
    let mut required = Vec::new();
    for param in params {
        let mut schema = param.kind.schema();
        if let JsonValue::Object(obj) = &mut schema {
            obj.insert(
                "description".to_string(),
                JsonValue::String(param.description.clone()),
            );
            if let Some(default) = &param.default {
                obj.insert("default".to_string(), default.clone());
            }
        }
        props.insert(param.name.clone(), schema);
        if param.required {
            required.push(JsonValue::String(param.name.clone()));
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": required
    })
}

/// Arguments after binding: every required parameter present, defaults
/// filled in, nothing undeclared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Map<String, JsonValue>,
}

impl Args {
    /// Required string argument.
    pub fn str(&self, name: &str) -> Result<&str> {
        self.opt_str(name)
            .ok_or_else(|| McpError::MissingArg(name.to_string()))
    }

    /// Optional string argument.
    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_str())
    }

    /// Required integer argument.
    pub fn i64(&self, name: &str) -> Result<i64> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| McpError::MissingArg(name.to_string()))?;
        value.as_i64().ok_or_else(|| McpError::InvalidArg {
            name: name.to_string(),
            reason: format!("{} is out of range", value),
        })
    }

    /// Optional array argument.
    pub fn opt_array(&self, name: &str) -> Option<&[JsonValue]> {
        self.values
            .get(name)
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
    }

    /// The bound arguments as a JSON object.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.values.clone())
    }
}

/// Bind raw call arguments against declared parameters.
///
/// `raw` may be an object (by name), an array (positional) or null (no
/// arguments). Omitted or null optional parameters take their default.
pub fn bind(params: &[ParamSpec], raw: JsonValue) -> Result<Args> {
    let mut supplied = match raw {
        JsonValue::Null => Map::new(),
        JsonValue::Object(map) => {
            if let Some(extra) = map.keys().find(|k| !params.iter().any(|p| &p.name == *k)) {
                return Err(McpError::UnexpectedArg(extra.clone()));
            }
            map
        }
        JsonValue::Array(values) => {
            if values.len() > params.len() {
                return Err(McpError::UnexpectedArg(format!(
                    "expected at most {} positional argument(s), got {}",
                    params.len(),
                    values.len()
                )));
            }
            params
                .iter()
                .zip(values)
                .map(|(param, value)| (param.name.clone(), value))
                .collect()
        }
        other => {
            return Err(McpError::InvalidArg {
                name: "arguments".to_string(),
                reason: format!("expected an object or array, got {}", other),
            })
        }
    };

    let mut values = Map::new();
    for param in params {
        match supplied.remove(&param.name) {
            Some(value) if !value.is_null() => {
                if !param.kind.accepts(&value) {
                    return Err(McpError::InvalidArg {
                        name: param.name.clone(),
                        reason: format!("expected {}", param.kind.name()),
                    });
                }
                values.insert(param.name.clone(), value);
            }
            _ => {
                if let Some(default) = &param.default {
                    values.insert(param.name.clone(), default.clone());
                } else if param.required {
                    return Err(McpError::MissingArg(param.name.clone()));
                }
            }
        }
    }

    Ok(Args { values })
}
