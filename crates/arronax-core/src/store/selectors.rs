// ── Selectors ──
//
// Read-only projections over `ExplorerState`. Everything scoped to an entity
// reads the selected one.

use indexmap::IndexMap;

use super::state::{AvailableValues, ExplorerState};
use crate::model::{
    AttributeDefinition, EntityKind, Filter, Operation, Record, Sort, operators_for,
};
use crate::query::default_sort;

pub fn items(state: &ExplorerState) -> &[Record] {
    &state.current().items
}

pub fn loading(state: &ExplorerState) -> bool {
    state.is_loading()
}

pub fn columns(state: &ExplorerState) -> &[AttributeDefinition] {
    &state.current().columns
}

pub fn network(state: &ExplorerState) -> &str {
    &state.network
}

pub fn platform(state: &ExplorerState) -> &str {
    &state.platform
}

pub fn entity(state: &ExplorerState) -> EntityKind {
    state.selected_entity
}

pub fn attributes(state: &ExplorerState) -> &[AttributeDefinition] {
    &state.current().attributes
}

pub fn attribute<'a>(state: &'a ExplorerState, name: &str) -> Option<&'a AttributeDefinition> {
    attributes(state).iter().find(|a| a.name == name)
}

/// Operators offered for an attribute of the selected entity.
pub fn operators(state: &ExplorerState, attribute_name: &str) -> &'static [Operation] {
    attribute(state, attribute_name).map_or(&[], |a| operators_for(a.data_type))
}

pub fn selected_filters(state: &ExplorerState) -> &[Filter] {
    &state.current().filters
}

pub fn available_values(state: &ExplorerState) -> Option<&AvailableValues> {
    state
        .available_values
        .as_ref()
        .filter(|v| v.entity == state.selected_entity)
}

pub fn selected_values(state: &ExplorerState) -> &IndexMap<String, Vec<String>> {
    &state.current().selected_values
}

pub fn rows(state: &ExplorerState) -> usize {
    state.row_count
}

pub fn is_full_loaded(state: &ExplorerState) -> bool {
    state.current().is_full_loaded
}

pub fn modal_item(state: &ExplorerState) -> Option<&Record> {
    state.modal.as_ref().and_then(|m| m.item.as_ref())
}

/// Explicit sort of the selected entity, else the default fetch ordering.
pub fn sort(state: &ExplorerState) -> Option<Sort> {
    let data = state.current();
    data.sort
        .clone()
        .or_else(|| default_sort(&data.attributes))
}

/// Attribute single records of the selected entity are looked up by.
///
/// The well-known key of the entity when the server lists it, else the first
/// unique-key attribute, else the well-known key regardless.
pub fn primary_key(state: &ExplorerState) -> String {
    let kind = state.selected_entity;
    let attrs = attributes(state);
    if attrs.is_empty() || attrs.iter().any(|a| a.name == kind.primary_key()) {
        return kind.primary_key().to_owned();
    }
    attrs
        .iter()
        .find(|a| a.is_unique_key())
        .map_or_else(|| kind.primary_key().to_owned(), |a| a.name.clone())
}
