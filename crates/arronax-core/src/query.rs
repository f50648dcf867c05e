// ── Query construction ──
//
// Pure functions turning explorer state into Conseil queries. The thunks in
// `explorer` fetch, call these, and dispatch the results.

use arronax_api::ConseilQuery;

use crate::error::CoreError;
use crate::model::{AttributeDefinition, EntityKind, Filter, Operation, Sort};
use crate::store::EntityData;

/// Columns shown for blocks, in display order.
const BLOCK_COLUMNS: [&str; 4] = ["level", "timestamp", "hash", "predecessor"];

/// Columns shown for every other entity.
const INITIAL_COLUMN_COUNT: usize = 6;

/// Attribute names in server order, used as the query projection.
pub fn attribute_names(attributes: &[AttributeDefinition]) -> Vec<String> {
    attributes.iter().map(|a| a.name.clone()).collect()
}

/// The visible column subset for a freshly loaded entity.
pub fn initial_columns(
    entity: EntityKind,
    attributes: &[AttributeDefinition],
) -> Vec<AttributeDefinition> {
    match entity {
        EntityKind::Blocks => BLOCK_COLUMNS
            .iter()
            .filter_map(|name| attributes.iter().find(|a| a.name == *name))
            .cloned()
            .collect(),
        EntityKind::Accounts | EntityKind::Operations => attributes
            .iter()
            .take(INITIAL_COLUMN_COUNT)
            .cloned()
            .collect(),
    }
}

/// Newest-first ordering: `block_level` when the entity has it, else `level`.
pub fn default_sort(attributes: &[AttributeDefinition]) -> Option<Sort> {
    ["block_level", "level"]
        .into_iter()
        .find(|field| attributes.iter().any(|a| a.name == *field))
        .map(Sort::desc)
}

/// Snake-case and lowercase a display label of an enum-like attribute
/// (`"Double Baking Evidence"` → `"double_baking_evidence"`).
///
/// Values of other attributes pass through untouched.
pub fn normalize_value(entity: EntityKind, attribute: &str, value: &str) -> String {
    if !entity.normalized_attributes().contains(&attribute) {
        return value.to_owned();
    }
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Query for the initial page of an entity.
pub fn items_query(
    attributes: &[AttributeDefinition],
    limit: usize,
) -> Result<ConseilQuery, CoreError> {
    let mut query = ConseilQuery::blank()
        .add_fields(attribute_names(attributes))
        .set_limit(limit)?;
    if let Some(sort) = default_sort(attributes) {
        query = query.add_ordering(sort.order_by, sort.order);
    }
    Ok(query)
}

/// Query for the current filters, page size and sort of one entity.
///
/// A filter only becomes a predicate once it has a selected value, except
/// for operators that take none.
pub fn filter_query(
    entity: EntityKind,
    data: &EntityData,
    limit: usize,
) -> Result<ConseilQuery, CoreError> {
    let mut query = ConseilQuery::blank().add_fields(attribute_names(&data.attributes));

    for filter in &data.filters {
        let values = data.selected_values.get(&filter.attribute).map(Vec::as_slice);
        query = add_filter_predicate(query, entity, filter, values)?;
    }

    query = query.set_limit(limit)?;

    if let Some(sort) = data.sort.clone().or_else(|| default_sort(&data.attributes)) {
        query = query.add_ordering(sort.order_by, sort.order);
    }
    Ok(query)
}

fn add_filter_predicate(
    query: ConseilQuery,
    entity: EntityKind,
    filter: &Filter,
    values: Option<&[String]>,
) -> Result<ConseilQuery, CoreError> {
    if !filter.needs_value() {
        let none: [String; 0] = [];
        return Ok(query.add_predicate(&filter.attribute, filter.operator, none, filter.inverse)?);
    }

    let Some(values) = values.filter(|v| !v.is_empty()) else {
        return Ok(query);
    };

    let set: Vec<String> = values
        .iter()
        .map(|v| normalize_value(entity, &filter.attribute, v))
        .collect();
    Ok(query.add_predicate(&filter.attribute, filter.operator, set, filter.inverse)?)
}

/// Query fetching the single record with `key = value`.
pub fn primary_key_query(
    attributes: &[AttributeDefinition],
    key: &str,
    value: &str,
) -> Result<ConseilQuery, CoreError> {
    Ok(ConseilQuery::blank()
        .add_fields(attribute_names(attributes))
        .add_predicate(key, Operation::Eq, [value], false)?
        .set_limit(1)?)
}
