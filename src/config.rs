//! Server configuration.
//!
//! Built once at startup (see `main.rs`) and handed to
//! [`Session::open`](crate::Session::open). Nothing reads configuration from
//! globals.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value as JsonValue;

/// Default server name reported in `initialize`.
pub const DEFAULT_SERVER_NAME: &str = "workbench-mcp";
/// Default location of the note store.
pub const DEFAULT_DB_PATH: &str = "data/app.db";
/// Default store timeout, in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
/// Largest store timeout, in seconds. SQLite takes its busy timeout as
/// `i32` milliseconds.
pub const MAX_QUERY_TIMEOUT_SECS: u64 = i32::MAX as u64 / 1000;
/// Largest file `read_file` will load (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
/// Default tracing level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server name reported to clients
    pub server_name: String,
    /// Server version reported to clients
    pub server_version: String,
    /// SQLite file backing the note store
    pub db_path: PathBuf,
    /// Busy timeout and statement deadline for store calls; zero disables the deadline
    pub query_timeout: Duration,
    /// Maximum size in bytes of a file read through `read_file`
    pub max_file_size: u64,
    /// Tracing filter directive used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Configuration with defaults and the given store path.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    /// Set the store timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the maximum readable file size.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// JSON view served by the `config://current` resource.
    pub fn to_json(&self) -> JsonValue {
        serde_json::json!({
            "server_name": self.server_name,
            "server_version": self.server_version,
            "db_path": self.db_path.display().to_string(),
            "query_timeout_secs": self.query_timeout.as_secs_f64(),
            "max_file_size": self.max_file_size,
            "log_level": self.log_level,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("/tmp/x.db");
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.server_name, "workbench-mcp");
    }

    #[test]
    fn test_to_json() {
        let config = Config::new("notes.db").with_query_timeout(Duration::from_millis(1500));
        let json = config.to_json();
        assert_eq!(json["db_path"], "notes.db");
        assert_eq!(json["query_timeout_secs"], 1.5);
        assert_eq!(json["log_level"], "info");
    }
}
