//! Text file operations.
//!
//! Every entry point validates its path first and then works on the
//! resolved absolute path. Failures come back as envelopes.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::envelope::Envelope;
use crate::error::{McpError, Result};
use crate::paths::{self, Access};

/// File handlers with a read size limit.
#[derive(Debug, Clone, Copy)]
pub struct FileHandlers {
    max_file_size: u64,
}

impl FileHandlers {
    /// Handlers that refuse to read files larger than `max_file_size` bytes.
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    /// Read a UTF-8 text file.
    ///
    /// Success fields: `content`, `file_size`, `lines`, `file_path`.
    pub fn read_text_file(&self, path: &str) -> Envelope {
        report("read", path, self.try_read(path))
    }

    /// Create or overwrite a text file, creating missing parent directories.
    ///
    /// Success fields: `message`, `bytes_written`, `file_path`.
    pub fn write_text_file(&self, path: &str, content: &str) -> Envelope {
        report("write", path, self.try_write(path, content))
    }

    /// List the entries of a directory, sorted by name.
    ///
    /// Success fields: `directory`, `items`, `total_items`.
    pub fn list_directory(&self, path: &str) -> Envelope {
        report("list", path, self.try_list(path))
    }

    fn try_read(&self, path: &str) -> Result<Envelope> {
        let validated = paths::validate(path, Access::ReadFile)?;
        let file_size = fs::metadata(validated.resolved())?.len();
        if file_size > self.max_file_size {
            return Err(McpError::Validation(format!(
                "file too large: {} is {} bytes, limit is {} bytes",
                path, file_size, self.max_file_size
            )));
        }

        let content = fs::read_to_string(validated.resolved())?;
        debug!(path, bytes = file_size, "read file");

        Ok(Envelope::success()
            .with("lines", content.lines().count())
            .with("content", content)
            .with("file_size", file_size)
            .with("file_path", path))
    }

    fn try_write(&self, path: &str, content: &str) -> Result<Envelope> {
        let validated = paths::validate(path, Access::Write)?;
        let target = validated.resolved();
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, content)?;
        info!(path = %target.display(), bytes = content.len(), "wrote file");

        Ok(Envelope::success()
            .with("message", format!("File written successfully: {}", path))
            .with("bytes_written", content.len())
            .with("file_path", path))
    }

    fn try_list(&self, path: &str) -> Result<Envelope> {
        let validated = paths::validate(path, Access::ListDirectory)?;

        let mut items = Vec::new();
        for entry in fs::read_dir(validated.resolved())? {
            let entry = entry?;
            items.push(describe_entry(&entry.path(), &entry.file_name().to_string_lossy())?);
        }
        items.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

        Ok(Envelope::success()
            .with("directory", path)
            .with("total_items", items.len())
            .with("items", items))
    }
}

fn describe_entry(path: &Path, name: &str) -> Result<JsonValue> {
    // Dangling symlinks have no target metadata; describe the link itself.
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => fs::symlink_metadata(path)?,
    };
    Ok(serde_json::json!({
        "name": name,
        "type": if meta.is_dir() { "directory" } else { "file" },
        "size": meta.len(),
        "modified": meta.modified().ok().map(timestamp),
    }))
}

/// RFC 3339 UTC rendering of a filesystem timestamp.
pub(crate) fn timestamp(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

fn report(op: &str, path: &str, result: Result<Envelope>) -> Envelope {
    match result {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(op, path, error = %err, "file operation failed");
            Envelope::from_error(&err)
        }
    }
}
