//! Metadata command handlers: entities, attributes, distinct values.

use tabled::Tabled;

use arronax_core::{AttributeDefinition, EntityDefinition, Explorer, display::humanize};

use crate::cli::{AttributesArgs, GlobalOpts, ValuesArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "Records")]
    count: u64,
}

impl From<&EntityDefinition> for EntityRow {
    fn from(e: &EntityDefinition) -> Self {
        Self {
            name: e.name.clone(),
            display_name: e.display_name.clone(),
            count: e.count,
        }
    }
}

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "Type")]
    data_type: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Cardinality")]
    cardinality: String,
}

impl From<&AttributeDefinition> for AttributeRow {
    fn from(a: &AttributeDefinition) -> Self {
        Self {
            name: a.name.clone(),
            display_name: a.display_name.clone(),
            data_type: a.data_type.to_string(),
            key: if a.is_unique_key() { "unique" } else { "" }.into(),
            cardinality: a.cardinality.map(|c| c.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Label")]
    label: String,
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn entities(explorer: &Explorer, global: &GlobalOpts) -> Result<(), CliError> {
    let entities = explorer.entities().await?;
    let out = output::render_list(
        global.output,
        &entities,
        |e| EntityRow::from(e),
        |e| e.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn attributes(
    explorer: &Explorer,
    args: &AttributesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let attributes = explorer.attributes(util::entity_kind(args.entity)).await?;
    let out = output::render_list(
        global.output,
        attributes.as_slice(),
        |a| AttributeRow::from(a),
        |a| a.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn values(
    explorer: &Explorer,
    args: &ValuesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entity = util::entity_kind(args.entity);
    let attributes = explorer.attributes(entity).await?;
    util::require_attribute(&attributes, entity, &args.attribute)?;

    let values = explorer
        .attribute_values(entity, &args.attribute, args.prefix.as_deref())
        .await?;
    let out = output::render_list(
        global.output,
        values.as_slice(),
        |v| ValueRow {
            value: v.clone(),
            label: humanize(v),
        },
        Clone::clone,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
