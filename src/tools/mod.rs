//! Built-in tools.
//!
//! Each category module registers its tools with the [`Registry`].

pub mod files;
pub mod notes;
pub mod query;

use crate::error::Result;
use crate::registry::Registry;

/// Register every built-in tool.
pub fn register(registry: &mut Registry) -> Result<()> {
    notes::register(registry)?;
    query::register(registry)?;
    files::register(registry)?;
    Ok(())
}
