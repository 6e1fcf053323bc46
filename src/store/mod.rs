//! Generic parameterized statement execution against the SQLite note store.
//!
//! Every call opens its own connection, runs one statement and closes the
//! connection again. Statements are not filtered: anything SQLite accepts,
//! including destructive DDL, is executed.

pub mod notes;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::config::{Config, MAX_QUERY_TIMEOUT_SECS};
use crate::convert::sql_to_json;
use crate::envelope::Envelope;
use crate::error::{McpError, Result};

pub use notes::{Note, NoteStore};

/// Baseline schema, safe to apply on every start.
const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Progress handler granularity, in SQLite VM instructions.
const PROGRESS_INTERVAL: i32 = 1_000;

/// How a statement's outcome is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Rows are fetched and returned as `data` with a `count`.
    Query,
    /// Changes are committed; `affected_rows` and `last_row_id` are returned.
    Mutation,
}

/// Classify a statement by its leading keyword.
///
/// Anything whose trimmed text starts with `SELECT` (any case) is a query;
/// every other statement is a mutation.
pub fn classify_statement(statement: &str) -> StatementKind {
    let head = statement.trim_start().as_bytes();
    if head.len() >= 6 && head[..6].eq_ignore_ascii_case(b"SELECT") {
        StatementKind::Query
    } else {
        StatementKind::Mutation
    }
}

/// Runs statements against a file-backed SQLite database.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    db_path: PathBuf,
    timeout: Duration,
}

impl QueryExecutor {
    /// Open the store described by `config`, creating the file and the
    /// baseline schema if needed.
    pub fn open(config: &Config) -> Result<Self> {
        if config.query_timeout > Duration::from_secs(MAX_QUERY_TIMEOUT_SECS) {
            return Err(McpError::Validation(format!(
                "query timeout of {}s exceeds the maximum of {}s",
                config.query_timeout.as_secs(),
                MAX_QUERY_TIMEOUT_SECS
            )));
        }

        let executor = Self {
            db_path: config.db_path.clone(),
            timeout: config.query_timeout,
        };
        executor.bootstrap()?;
        Ok(executor)
    }

    /// Path of the backing database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Create the baseline schema. Idempotent.
    pub fn bootstrap(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %self.db_path.display(), "note store schema ready");
        Ok(())
    }

    /// Execute `statement` with positional `params`.
    ///
    /// Never fails outright: errors are reported as failure envelopes.
    pub fn execute(&self, statement: &str, params: &[SqlValue]) -> Envelope {
        match self.try_execute(statement, params) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(error = %err, "statement failed");
                Envelope::from_error(&err)
            }
        }
    }

    fn try_execute(&self, statement: &str, params: &[SqlValue]) -> Result<Envelope> {
        if statement.trim().is_empty() {
            return Err(McpError::Validation("statement cannot be empty".to_string()));
        }

        let kind = classify_statement(statement);
        debug!(?kind, params = params.len(), "executing statement");

        let conn = self.connect()?;
        let mut stmt = conn.prepare(statement)?;

        let expected = stmt.parameter_count();
        if expected != params.len() {
            return Err(McpError::ParameterCount {
                expected,
                given: params.len(),
            });
        }

        match kind {
            StatementKind::Query => {
                let columns: Vec<String> =
                    stmt.column_names().into_iter().map(String::from).collect();

                let mut rows = stmt.query(params_from_iter(params.iter()))?;
                let mut data = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut record = Map::new();
                    for (idx, column) in columns.iter().enumerate() {
                        record.insert(column.clone(), sql_to_json(row.get_ref(idx)?));
                    }
                    data.push(JsonValue::Object(record));
                }

                Ok(Envelope::success()
                    .with("count", data.len())
                    .with("data", data))
            }
            StatementKind::Mutation => {
                // Step through any rows so statements like PRAGMA or
                // INSERT ... RETURNING still run to completion.
                let mut rows = stmt.query(params_from_iter(params.iter()))?;
                while rows.next()?.is_some() {}
                drop(rows);

                Ok(Envelope::success()
                    .with("affected_rows", conn.changes())
                    .with("last_row_id", conn.last_insert_rowid()))
            }
        }
    }

    /// Open a connection, creating the database file and its directory.
    fn connect(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.db_path, flags)?;

        if !self.timeout.is_zero() {
            conn.busy_timeout(self.timeout)?;
            if let Some(deadline) = Instant::now().checked_add(self.timeout) {
                conn.progress_handler(PROGRESS_INTERVAL, Some(move || Instant::now() >= deadline));
            }
        }

        Ok(conn)
    }
}
