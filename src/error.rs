//! Error types for the MCP server.
//!
//! Every failure inside the server is an [`McpError`]. Handlers never hand
//! these to the protocol layer directly: the dispatcher folds them into a
//! failure [`Envelope`](crate::Envelope) tagged with an [`ErrorKind`].

use serde::{Deserialize, Serialize};

use crate::paths::PathRejection;

/// Closed set of error categories surfaced to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input shape or path, detected before any I/O.
    ValidationError,
    /// Missing file, unknown operation or unknown resource address.
    NotFoundError,
    /// Store or file I/O failure.
    ExecutionError,
    /// Parameter binding mismatch.
    ArgumentError,
}

impl ErrorKind {
    /// Wire name of the kind, as it appears in `error_kind`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::NotFoundError => "not_found_error",
            ErrorKind::ExecutionError => "execution_error",
            ErrorKind::ArgumentError => "argument_error",
        }
    }

    /// JSON-RPC error code used when a failure is reported as a protocol error.
    pub fn rpc_code(&self) -> i32 {
        match self {
            ErrorKind::ValidationError | ErrorKind::ArgumentError | ErrorKind::NotFoundError => {
                rpc_codes::INVALID_PARAMS
            }
            ErrorKind::ExecutionError => rpc_codes::INTERNAL_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MCP server errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum McpError {
    /// No operation is registered under the name, or no template matches the address.
    #[error("unknown {namespace}: {name}")]
    UnknownOperation {
        /// Namespace that was searched
        namespace: String,
        /// Requested name or address
        name: String,
    },

    /// A name or template registered twice in one namespace.
    #[error("duplicate {namespace} registration: {name}")]
    DuplicateRegistration {
        /// Namespace of the registration
        namespace: String,
        /// The duplicated name or template
        name: String,
    },

    /// Two resource templates could match the same address.
    #[error("resource template '{template}' overlaps existing template '{existing}'")]
    TemplateConflict {
        /// Template being registered
        template: String,
        /// Already registered template it collides with
        existing: String,
    },

    /// Malformed resource template.
    #[error("invalid resource template '{template}': {reason}")]
    InvalidTemplate {
        /// The offending template
        template: String,
        /// What is wrong with it
        reason: String,
    },

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// Argument supplied that the operation does not declare.
    #[error("unexpected argument: {0}")]
    UnexpectedArg(String),

    /// Invalid argument value.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Statement placeholder count differs from the number of bound parameters.
    #[error("parameter binding mismatch: statement expects {expected} parameter(s), {given} supplied")]
    ParameterCount {
        /// Placeholders in the statement
        expected: usize,
        /// Parameters supplied by the caller
        given: usize,
    },

    /// Input rejected before any I/O.
    #[error("{0}")]
    Validation(String),

    /// Path rejected by the validator.
    #[error("{0}")]
    Path(#[from] PathRejection),

    /// Error from the embedded store.
    #[error("database error: {0}")]
    Database(String),

    /// Statement interrupted after exceeding the configured timeout.
    #[error("statement interrupted: query timeout exceeded")]
    Timeout,

    /// JSON-RPC protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Category reported to the agent for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            McpError::UnknownOperation { .. } => ErrorKind::NotFoundError,
            McpError::MissingArg(_)
            | McpError::UnexpectedArg(_)
            | McpError::InvalidArg { .. }
            | McpError::ParameterCount { .. } => ErrorKind::ArgumentError,
            McpError::Validation(_)
            | McpError::DuplicateRegistration { .. }
            | McpError::TemplateConflict { .. }
            | McpError::InvalidTemplate { .. }
            | McpError::Protocol(_) => ErrorKind::ValidationError,
            McpError::Path(rejection) => rejection.kind(),
            McpError::Database(_)
            | McpError::Timeout
            | McpError::Io(_)
            | McpError::Internal(_) => ErrorKind::ExecutionError,
        }
    }

    /// Convert to JSON-RPC error code.
    pub fn rpc_code(&self) -> i32 {
        match self {
            McpError::Protocol(_) => rpc_codes::INVALID_REQUEST,
            McpError::UnknownOperation { .. } => rpc_codes::METHOD_NOT_FOUND,
            other => other.kind().rpc_code(),
        }
    }
}

impl From<rusqlite::Error> for McpError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::InvalidParameterCount(given, expected) => {
                McpError::ParameterCount { expected, given }
            }
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.code == rusqlite::ErrorCode::OperationInterrupted =>
            {
                McpError::Timeout
            }
            other => McpError::Database(other.to_string()),
        }
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Protocol(format!("JSON error: {}", err))
    }
}

/// JSON-RPC error codes.
pub mod rpc_codes {
    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = McpError::UnknownOperation {
            namespace: "tool".to_string(),
            name: "nope".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFoundError);
        assert_eq!(err.to_string(), "unknown tool: nope");

        assert_eq!(McpError::MissingArg("x".into()).kind(), ErrorKind::ArgumentError);
        assert_eq!(McpError::Database("boom".into()).kind(), ErrorKind::ExecutionError);
        assert_eq!(
            McpError::Path(PathRejection::EmptyPath).kind(),
            ErrorKind::ValidationError
        );
    }

    #[test]
    fn test_invalid_parameter_count_maps_to_argument_error() {
        let err = McpError::from(rusqlite::Error::InvalidParameterCount(0, 1));
        assert_eq!(err.kind(), ErrorKind::ArgumentError);
        assert!(err.to_string().contains("binding mismatch"));
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_value(ErrorKind::NotFoundError).unwrap();
        assert_eq!(json, serde_json::json!("not_found_error"));
        assert_eq!(ErrorKind::ArgumentError.to_string(), "argument_error");
    }
}
