//! Get command implementation

use crate::commands::write_document;
use crate::error::{CliError, Result};
use pass_client::model::EntityType;
use pass_client::{with_entity_type, Entity, PassClient};
use std::io::Write;
use tracing::debug;

/// Run the get command
///
/// Prints the object as a pretty JSON:API document, or fails with
/// [`CliError::NotFound`].
pub async fn run<W: Write>(
    client: &PassClient,
    entity_type: &str,
    id: &str,
    include: &[String],
    out: &mut W,
) -> Result<()> {
    let entity_type: EntityType = entity_type.parse()?;
    debug!(%entity_type, id, ?include, "Fetching object");

    with_entity_type!(entity_type, T => fetch::<T, W>(client, id, include, out).await)
}

async fn fetch<E: Entity, W: Write>(
    client: &PassClient,
    id: &str,
    include: &[String],
    out: &mut W,
) -> Result<()> {
    let include: Vec<&str> = include.iter().map(String::as_str).collect();

    let entity = client
        .get_object::<E>(id, &include)
        .await?
        .ok_or_else(|| CliError::not_found(E::TYPE, id))?;

    write_document(out, &entity, true)
}
