//! Delete command implementation

use crate::error::Result;
use pass_client::model::EntityType;
use pass_client::{with_entity_type, PassClient};
use std::io::Write;

/// Run the delete command
pub async fn run<W: Write>(client: &PassClient, entity_type: &str, id: &str, out: &mut W) -> Result<()> {
    let entity_type: EntityType = entity_type.parse()?;

    with_entity_type!(entity_type, T => client.delete_object::<T>(id).await?);

    writeln!(out, "Deleted {} '{}'", entity_type, id)?;
    Ok(())
}
