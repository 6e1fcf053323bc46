//! Server session.
//!
//! Owns the configuration and the store handle that every handler works
//! against. Built once at startup and shared read-only with all handlers.

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::files::FileHandlers;
use crate::store::{NoteStore, QueryExecutor};

/// Per-process handler context.
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    store: QueryExecutor,
}

impl Session {
    /// Open the store described by `config` and bootstrap its schema.
    pub fn open(config: Config) -> Result<Self> {
        let store = QueryExecutor::open(&config)?;
        info!(db = %config.db_path.display(), "session opened");
        Ok(Self { config, store })
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Generic statement executor.
    pub fn store(&self) -> &QueryExecutor {
        &self.store
    }

    /// Canned note operations.
    pub fn notes(&self) -> NoteStore<'_> {
        NoteStore::new(&self.store)
    }

    /// File operations, bounded by the configured read limit.
    pub fn files(&self) -> FileHandlers {
        FileHandlers::new(self.config.max_file_size)
    }
}
