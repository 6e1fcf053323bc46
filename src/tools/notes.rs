//! Note tools.
//!
//! Tools: quick_note, find_notes, recent_notes

use crate::error::Result;
use crate::registry::{Namespace, Operation, ParamSpec, ParamType, Registry};

/// Register the note tools.
pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        Namespace::Tool,
        Operation::new(
            "quick_note",
            "Save a note with a title and content. Returns the new note's id as last_row_id.",
            |session, args| {
                Ok(session
                    .notes()
                    .create(args.str("title")?, Some(args.str("content")?)))
            },
        )
        .param(ParamSpec::required("title", ParamType::String, "Note title"))
        .param(ParamSpec::required("content", ParamType::String, "Note body")),
    )?;

    registry.register(
        Namespace::Tool,
        Operation::new(
            "find_notes",
            "Find notes whose title or content contains the search term. \
             Matching is literal and ignores ASCII case.",
            |session, args| Ok(session.notes().search(args.str("search_term")?)),
        )
        .param(ParamSpec::required(
            "search_term",
            ParamType::String,
            "Text to look for",
        )),
    )?;

    registry.register(
        Namespace::Tool,
        Operation::new(
            "recent_notes",
            "List the most recently created notes, newest first.",
            |session, args| Ok(session.notes().list_recent(args.i64("limit")?)),
        )
        .param(ParamSpec::with_default(
            "limit",
            ParamType::Integer,
            "Maximum number of notes to return",
            10,
        )),
    )?;

    Ok(())
}
