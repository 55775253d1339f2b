//! Select command implementation
//!
//! Prints one compact JSON:API document per line, so the output can be fed
//! to `jq -c` or split line by line.

use crate::commands::write_document;
use crate::error::Result;
use pass_client::model::EntityType;
use pass_client::{with_entity_type, Entity, PassClient, PassClientSelector};
use std::io::Write;
use tracing::info;

/// Query options of the select command
#[derive(Debug, Clone, Default)]
pub struct SelectOptions {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub include: Vec<String>,
    pub offset: u64,
    pub limit: u64,
    /// Walk every page starting at `offset`
    pub all: bool,
}

/// Run the select command
pub async fn run<W: Write>(
    client: &PassClient,
    entity_type: &str,
    options: &SelectOptions,
    out: &mut W,
) -> Result<()> {
    let entity_type: EntityType = entity_type.parse()?;

    with_entity_type!(entity_type, T => select::<T, W>(client, options, out).await)
}

async fn select<E: Entity, W: Write>(client: &PassClient, options: &SelectOptions, out: &mut W) -> Result<()> {
    let mut selector = PassClientSelector::<E>::new()
        .offset(options.offset)
        .limit(options.limit)
        .include(options.include.iter().cloned());
    if let Some(filter) = &options.filter {
        selector = selector.filter(filter.clone());
    }
    if let Some(sort) = &options.sort {
        selector = selector.sorting(sort.clone());
    }

    if !options.all {
        let result = client.select_objects(&selector).await?;
        for entity in &result.objects {
            write_document(out, entity, false)?;
        }
        info!(entity_type = %E::TYPE, count = result.objects.len(), total = result.total, "Selected objects");
        return Ok(());
    }

    let mut objects = client.stream_objects(selector);
    let mut count = 0usize;
    while let Some(entity) = objects.next().await {
        write_document(out, &entity?, false)?;
        count += 1;
    }
    info!(
        entity_type = %E::TYPE,
        count,
        pages = objects.pages_fetched(),
        total = objects.estimated_total(),
        "Selected objects"
    );

    Ok(())
}
