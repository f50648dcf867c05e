// ── State mutations ──
//
// Every change to `ExplorerState` is one of these actions applied by
// `reduce`. Thunks and UI code dispatch them through the `StateStore`.

use std::sync::Arc;

use strum::IntoStaticStr;
use tracing::trace;

use super::state::{AvailableValues, ExplorerState, ModalState};
use crate::config::DEFAULT_ROW_COUNT;
use crate::model::{AttributeDefinition, EntityKind, Filter, Operation, PerEntity, Record, Sort};

#[derive(Debug, Clone, IntoStaticStr)]
pub enum StoreAction {
    /// Drop everything fetched or chosen. Network, entity, page size and
    /// the loading depth survive.
    InitData,
    SetNetwork {
        network: String,
        platform: String,
    },
    SetEntity(EntityKind),
    SetAttributes {
        entity: EntityKind,
        attributes: Vec<AttributeDefinition>,
    },
    SetColumns {
        entity: EntityKind,
        columns: Vec<AttributeDefinition>,
    },
    SetItems {
        entity: EntityKind,
        items: Vec<Record>,
        limit: usize,
    },
    SetLoading(bool),
    SetRowCount(usize),
    SetSort {
        entity: EntityKind,
        sort: Sort,
    },
    AddFilter {
        entity: EntityKind,
        filter: Filter,
    },
    RemoveFilter {
        entity: EntityKind,
        attribute: String,
    },
    SetFilterOperator {
        entity: EntityKind,
        attribute: String,
        operator: Operation,
        inverse: bool,
    },
    SetSelectedValue {
        entity: EntityKind,
        attribute: String,
        values: Vec<String>,
    },
    ClearFilters(EntityKind),
    SetAvailableValues(Option<AvailableValues>),
    SetModalItem {
        entity: EntityKind,
        key: String,
        value: String,
        item: Option<Record>,
    },
    ClearModal,
    SetError(Option<String>),
}

impl StoreAction {
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Apply one action to the state.
#[allow(clippy::too_many_lines)]
pub fn reduce(state: &mut ExplorerState, action: StoreAction) {
    trace!(action = action.name(), "reduce");

    match action {
        StoreAction::InitData => {
            state.entities = PerEntity::default();
            state.available_values = None;
            state.modal = None;
            state.last_error = None;
        }
        StoreAction::SetNetwork { network, platform } => {
            state.network = network;
            state.platform = platform;
        }
        StoreAction::SetEntity(entity) => {
            state.selected_entity = entity;
            // value lists belong to the entity they were fetched for
            if state
                .available_values
                .as_ref()
                .is_some_and(|v| v.entity != entity)
            {
                state.available_values = None;
            }
        }
        StoreAction::SetAttributes { entity, attributes } => {
            state.entities.get_mut(entity).attributes = Arc::new(attributes);
        }
        StoreAction::SetColumns { entity, columns } => {
            state.entities.get_mut(entity).columns = columns;
        }
        StoreAction::SetItems {
            entity,
            items,
            limit,
        } => {
            let data = state.entities.get_mut(entity);
            data.is_full_loaded = items.len() < limit;
            data.items = Arc::new(items);
        }
        StoreAction::SetLoading(true) => {
            state.loading_depth = state.loading_depth.saturating_add(1);
        }
        StoreAction::SetLoading(false) => {
            state.loading_depth = state.loading_depth.saturating_sub(1);
        }
        StoreAction::SetRowCount(rows) => {
            state.row_count = if rows == 0 { DEFAULT_ROW_COUNT } else { rows };
        }
        StoreAction::SetSort { entity, sort } => {
            state.entities.get_mut(entity).sort = Some(sort);
        }
        StoreAction::AddFilter { entity, filter } => {
            let data = state.entities.get_mut(entity);
            if !data.filters.iter().any(|f| f.attribute == filter.attribute) {
                data.filters.push(filter);
            }
        }
        StoreAction::RemoveFilter { entity, attribute } => {
            let data = state.entities.get_mut(entity);
            data.filters.retain(|f| f.attribute != attribute);
            data.selected_values.shift_remove(&attribute);
        }
        StoreAction::SetFilterOperator {
            entity,
            attribute,
            operator,
            inverse,
        } => {
            let data = state.entities.get_mut(entity);
            if let Some(filter) = data.filters.iter_mut().find(|f| f.attribute == attribute) {
                let arity_changed = filter.operator.arity() != operator.arity();
                filter.operator = operator;
                filter.inverse = inverse;
                if arity_changed {
                    data.selected_values.shift_remove(&attribute);
                }
            }
        }
        StoreAction::SetSelectedValue {
            entity,
            attribute,
            values,
        } => {
            let data = state.entities.get_mut(entity);
            if values.is_empty() {
                data.selected_values.shift_remove(&attribute);
            } else {
                data.selected_values.insert(attribute, values);
            }
        }
        StoreAction::ClearFilters(entity) => {
            let data = state.entities.get_mut(entity);
            data.filters.clear();
            data.selected_values.clear();
        }
        StoreAction::SetAvailableValues(values) => {
            state.available_values = values;
        }
        StoreAction::SetModalItem {
            entity,
            key,
            value,
            item,
        } => {
            state.modal = Some(ModalState {
                entity,
                key,
                value,
                item,
            });
        }
        StoreAction::ClearModal => {
            state.modal = None;
        }
        StoreAction::SetError(message) => {
            state.last_error = message;
        }
    }
}
