//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function. Commands write
//! their results to the given writer; the binary passes stdout.

pub mod delete;
pub mod get;
pub mod select;

use crate::error::Result;
use pass_client::{Entity, JsonApiCodec};
use std::io::Write;

/// Write `entity` as a JSON:API resource document
///
/// Relationships are rendered as identifiers only, whether or not they were
/// hydrated.
pub(crate) fn write_document<E: Entity>(out: &mut impl Write, entity: &E, pretty: bool) -> Result<()> {
    let document = JsonApiCodec::new().encode(entity)?;
    if pretty {
        serde_json::to_writer_pretty(&mut *out, &document)?;
    } else {
        serde_json::to_writer(&mut *out, &document)?;
    }
    writeln!(out)?;
    Ok(())
}
