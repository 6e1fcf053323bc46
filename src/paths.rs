//! File path validation.
//!
//! Rejects empty paths and any path with a `..` component, resolves the
//! rest to an absolute path, and checks existence according to the access
//! being requested. Handlers operate on the returned absolute path, never on
//! the caller's original string.
//!
//! This is not a sandbox: absolute paths are accepted and symlinks are
//! followed, so a validated path may point anywhere the process can reach.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::ErrorKind;

/// How the caller intends to use a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read an existing regular file.
    ReadFile,
    /// Create or overwrite a file. The path need not exist.
    Write,
    /// List an existing directory.
    ListDirectory,
}

/// Why a path was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathRejection {
    /// Empty or whitespace-only input.
    #[error("file path cannot be empty")]
    EmptyPath,
    /// A `..` component appears somewhere in the path.
    #[error("path traversal rejected: '{0}' contains a '..' component")]
    TraversalRejected(String),
    /// Nothing exists at the path.
    #[error("path does not exist: {0}")]
    NotFound(String),
    /// The path is a directory where a file was expected.
    #[error("path is not a file: {0}")]
    NotAFile(String),
    /// The path is not a directory where one was expected.
    #[error("path is not a directory: {0}")]
    NotADirectory(String),
    /// The working directory could not be determined.
    #[error("cannot resolve path '{path}': {reason}")]
    Unresolvable {
        /// Path as supplied
        path: String,
        /// Underlying I/O error
        reason: String,
    },
}

impl PathRejection {
    /// Error category reported for this rejection.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PathRejection::NotFound(_) => ErrorKind::NotFoundError,
            PathRejection::Unresolvable { .. } => ErrorKind::ExecutionError,
            _ => ErrorKind::ValidationError,
        }
    }
}

/// A path that passed validation, resolved to absolute form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    resolved: PathBuf,
}

impl ValidatedPath {
    /// Absolute path to operate on.
    pub fn resolved(&self) -> &Path {
        &self.resolved
    }
}

/// Validate `path` for the given access.
pub fn validate(path: &str, access: Access) -> Result<ValidatedPath, PathRejection> {
    if path.trim().is_empty() {
        return Err(PathRejection::EmptyPath);
    }

    let candidate = Path::new(path);
    if candidate.components().any(|c| c == Component::ParentDir) {
        return Err(PathRejection::TraversalRejected(path.to_string()));
    }

    let resolved = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| PathRejection::Unresolvable {
                path: path.to_string(),
                reason: e.to_string(),
            })?
            .join(candidate)
    };

    // fs::metadata follows symlinks.
    let metadata = fs::metadata(&resolved).ok();
    match (access, metadata) {
        (Access::ReadFile, None) | (Access::ListDirectory, None) => {
            return Err(PathRejection::NotFound(path.to_string()));
        }
        (Access::ReadFile, Some(meta)) | (Access::Write, Some(meta)) if meta.is_dir() => {
            return Err(PathRejection::NotAFile(path.to_string()));
        }
        (Access::ListDirectory, Some(meta)) if !meta.is_dir() => {
            return Err(PathRejection::NotADirectory(path.to_string()));
        }
        _ => {}
    }

    Ok(ValidatedPath { resolved })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path() {
        assert_eq!(validate("", Access::ReadFile), Err(PathRejection::EmptyPath));
        assert_eq!(validate("   ", Access::Write), Err(PathRejection::EmptyPath));
    }

    #[test]
    fn test_traversal_rejected() {
        for path in ["../etc/passwd", "notes/../../secret", "a/..", ".."] {
            assert!(
                matches!(
                    validate(path, Access::Write),
                    Err(PathRejection::TraversalRejected(_))
                ),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_double_dot_inside_name_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a..b").join("file.txt");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "x").unwrap();

        let validated = validate(file.to_str().unwrap(), Access::ReadFile).unwrap();
        assert_eq!(validated.resolved(), file.as_path());
    }

    #[test]
    fn test_existing_file_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello").unwrap();

        let validated = validate(file.to_str().unwrap(), Access::ReadFile).unwrap();
        assert!(validated.resolved().is_absolute());
        assert_eq!(validated.resolved(), file.as_path());
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        assert_eq!(
            validate(path, Access::ReadFile),
            Err(PathRejection::NotAFile(path.to_string()))
        );
        assert_eq!(
            validate(path, Access::Write),
            Err(PathRejection::NotAFile(path.to_string()))
        );
        assert!(validate(path, Access::ListDirectory).is_ok());
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let path = missing.to_str().unwrap();

        let err = validate(path, Access::ReadFile).unwrap_err();
        assert_eq!(err, PathRejection::NotFound(path.to_string()));
        assert_eq!(err.kind(), ErrorKind::NotFoundError);

        // Writes do not require existence.
        assert!(validate(path, Access::Write).is_ok());
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(
            validate(file.to_str().unwrap(), Access::ListDirectory),
            Err(PathRejection::NotADirectory(_))
        ));
    }

    #[test]
    fn test_relative_path_resolves_against_cwd() {
        let validated = validate("Cargo.toml", Access::ReadFile).unwrap();
        let expected = std::env::current_dir().unwrap().join("Cargo.toml");
        assert_eq!(validated.resolved(), expected.as_path());
    }
}
