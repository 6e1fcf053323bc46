//! File tools.
//!
//! Tools: read_file, save_file, explore_directory

use crate::error::Result;
use crate::registry::{Namespace, Operation, ParamSpec, ParamType, Registry};

/// Register the file tools.
pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        Namespace::Tool,
        Operation::new(
            "read_file",
            "Read a UTF-8 text file. Returns content, file_size and line count.",
            |session, args| Ok(session.files().read_text_file(args.str("file_path")?)),
        )
        .param(ParamSpec::required("file_path", ParamType::String, "File to read")),
    )?;

    registry.register(
        Namespace::Tool,
        Operation::new(
            "save_file",
            "Write text to a file, creating it and any missing parent directories. \
             Overwrites existing content.",
            |session, args| {
                Ok(session
                    .files()
                    .write_text_file(args.str("file_path")?, args.str("content")?))
            },
        )
        .param(ParamSpec::required("file_path", ParamType::String, "File to write"))
        .param(ParamSpec::required("content", ParamType::String, "Text to write")),
    )?;

    registry.register(
        Namespace::Tool,
        Operation::new(
            "explore_directory",
            "List a directory's entries with type, size and modification time.",
            |session, args| Ok(session.files().list_directory(args.str("directory_path")?)),
        )
        .param(ParamSpec::required(
            "directory_path",
            ParamType::String,
            "Directory to list",
        )),
    )
}
