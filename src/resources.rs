//! Built-in resources.
//!
//! Resources: notes://schema, workspace://current, system://status,
//! config://current, project://file/{file_path}

use std::fs;

use serde_json::Value as JsonValue;
use sysinfo::System;

use crate::envelope::Envelope;
use crate::error::{McpError, Result};
use crate::files::timestamp;
use crate::paths::{self, Access};
use crate::registry::{Namespace, Operation, ParamSpec, ParamType, Registry};
use crate::session::Session;

/// Register every built-in resource.
pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        Namespace::Resource,
        Operation::new(
            "notes://schema",
            "Tables in the notes database and their CREATE statements",
            |session, _| Ok(database_schema(session)),
        ),
    )?;

    registry.register(
        Namespace::Resource,
        Operation::new(
            "workspace://current",
            "Current working directory with file and directory counts",
            |_, _| current_workspace(),
        ),
    )?;

    registry.register(
        Namespace::Resource,
        Operation::new(
            "system://status",
            "Operating system, host, CPU and memory overview",
            |_, _| Ok(system_status()),
        ),
    )?;

    registry.register(
        Namespace::Resource,
        Operation::new(
            "config://current",
            "Active server configuration",
            |session, _| Ok(configuration(session)),
        ),
    )?;

    registry.register(
        Namespace::Resource,
        Operation::new(
            "project://file/{file_path}",
            "Metadata for a single file; percent-encode '/' in the path",
            |_, args| file_details(args.str("file_path")?),
        )
        .param(ParamSpec::required(
            "file_path",
            ParamType::String,
            "File to describe",
        )),
    )
}

fn database_schema(session: &Session) -> Envelope {
    let listing = session.store().execute(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
        &[],
    );
    if !listing.is_success() {
        return listing;
    }

    Envelope::success()
        .with("schema", listing.get("data").cloned().unwrap_or(JsonValue::Null))
        .with("table_count", listing.get("count").cloned().unwrap_or(JsonValue::Null))
}

fn current_workspace() -> Result<Envelope> {
    let cwd = std::env::current_dir()?;
    let mut files = 0usize;
    let mut directories = 0usize;
    for entry in fs::read_dir(&cwd)? {
        let path = entry?.path();
        if path.is_dir() {
            directories += 1;
        } else if path.is_file() {
            files += 1;
        }
    }

    Ok(Envelope::success()
        .with("current_directory", cwd.display().to_string())
        .with("total_files", files)
        .with("total_directories", directories))
}

fn system_status() -> Envelope {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    sys.refresh_memory();

    Envelope::success()
        .with("os_name", System::name())
        .with("os_version", System::os_version())
        .with("kernel_version", System::kernel_version())
        .with("host_name", System::host_name())
        .with("cpu_count", sys.cpus().len())
        .with("memory_total", sys.total_memory())
        .with("memory_used", sys.used_memory())
}

fn configuration(session: &Session) -> Envelope {
    match session.config().to_json() {
        JsonValue::Object(fields) => Envelope::Success(fields),
        _ => Envelope::from_error(&McpError::Internal(
            "configuration did not serialize to an object".to_string(),
        )),
    }
}

fn file_details(file_path: &str) -> Result<Envelope> {
    let validated = paths::validate(file_path, Access::ReadFile)?;
    let resolved = validated.resolved();
    let meta = fs::metadata(resolved)?;

    let file_name = resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_guess::from_path(resolved).first_raw();

    Ok(Envelope::success()
        .with("file_path", file_path)
        .with("file_name", file_name)
        .with("file_size", meta.len())
        .with("mime_type", mime_type)
        .with("modified", meta.modified().ok().map(timestamp))
        .with("created", meta.created().ok().map(timestamp))
        .with("readonly", meta.permissions().readonly()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn test_session() -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(Config::new(dir.path().join("app.db"))).unwrap();
        (dir, session)
    }

    #[test]
    fn test_schema_lists_notes_table() {
        let (_dir, session) = test_session();
        let env = database_schema(&session);
        assert_eq!(env.get("table_count"), Some(&json!(1)));
        let schema = env.get("schema").unwrap();
        assert_eq!(schema[0]["name"], json!("notes"));
        assert!(schema[0]["sql"].as_str().unwrap().contains("CREATE TABLE"));
    }

    #[test]
    fn test_configuration_is_flat() {
        let (_dir, session) = test_session();
        let env = configuration(&session);
        assert_eq!(env.get("server_name"), Some(&json!("workbench-mcp")));
        assert_eq!(env.get("max_file_size"), Some(&json!(10 * 1024 * 1024)));
    }

    #[test]
    fn test_system_status_fields() {
        let env = system_status();
        assert!(env.is_success());
        assert!(env.get("memory_total").unwrap().is_u64());
        assert!(env.get("cpu_count").is_some());
    }

    #[test]
    fn test_workspace_counts() {
        let env = current_workspace().unwrap();
        // Tests run from the crate root, which holds at least Cargo.toml and src/.
        assert!(env.get("total_files").unwrap().as_u64().unwrap() >= 1);
        assert!(env.get("total_directories").unwrap().as_u64().unwrap() >= 1);
    }

    #[test]
    fn test_file_details() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.json");
        fs::write(&file, "{}").unwrap();

        let env = file_details(file.to_str().unwrap()).unwrap();
        assert_eq!(env.get("file_name"), Some(&json!("report.json")));
        assert_eq!(env.get("file_size"), Some(&json!(2)));
        assert_eq!(env.get("mime_type"), Some(&json!("application/json")));
        assert_eq!(env.get("readonly"), Some(&json!(false)));
        assert!(env.get("modified").unwrap().is_string());
    }

    #[test]
    fn test_file_details_rejects_bad_paths() {
        let err = file_details("../secret").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        let dir = tempfile::tempdir().unwrap();
        let err = file_details(dir.path().join("gone.txt").to_str().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFoundError);
    }
}
