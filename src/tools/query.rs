//! Raw SQL tool.
//!
//! Tools: sql_query

use crate::convert::json_to_params;
use crate::error::Result;
use crate::registry::{Namespace, Operation, ParamSpec, ParamType, Registry};

/// Register the SQL tool.
pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        Namespace::Tool,
        Operation::new(
            "sql_query",
            "Run a SQL statement against the notes database with positional `?` parameters. \
             SELECT statements return data and count; anything else returns affected_rows \
             and last_row_id. Statements are not restricted.",
            |session, args| {
                let params = json_to_params(args.opt_array("params").unwrap_or_default())?;
                Ok(session.store().execute(args.str("query")?, &params))
            },
        )
        .param(ParamSpec::required("query", ParamType::String, "SQL statement"))
        .param(ParamSpec::optional(
            "params",
            ParamType::Array,
            "Positional parameter values (scalars only)",
        )),
    )
}
