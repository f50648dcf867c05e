use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::DEFAULT_ROW_COUNT;
use crate::model::{AttributeDefinition, EntityKind, Filter, PerEntity, Record, Sort};

/// Everything fetched or chosen for one entity kind.
///
/// Large collections sit behind `Arc` so snapshotting the whole state on each
/// dispatch stays cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityData {
    pub attributes: Arc<Vec<AttributeDefinition>>,
    pub columns: Vec<AttributeDefinition>,
    pub filters: Vec<Filter>,
    /// Selected value set per filter attribute.
    pub selected_values: IndexMap<String, Vec<String>>,
    pub items: Arc<Vec<Record>>,
    /// The last fetch returned fewer rows than it asked for.
    pub is_full_loaded: bool,
    pub sort: Option<Sort>,
}

/// Distinct values fetched for the value-select of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableValues {
    pub entity: EntityKind,
    pub attribute: String,
    /// Prefix the values were looked up with; `None` for the full list.
    pub prefix: Option<String>,
    pub values: Vec<String>,
}

/// The record shown in the detail modal and the key it was fetched by.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    pub entity: EntityKind,
    pub key: String,
    pub value: String,
    pub item: Option<Record>,
}

/// Application state. Mutated only through [`reduce`](super::reduce).
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerState {
    pub network: String,
    pub platform: String,
    pub selected_entity: EntityKind,
    pub entities: PerEntity<EntityData>,
    pub available_values: Option<AvailableValues>,
    /// Nesting depth of running thunks; loading while non-zero.
    pub loading_depth: u32,
    pub row_count: usize,
    pub modal: Option<ModalState>,
    pub last_error: Option<String>,
}

impl ExplorerState {
    pub fn new(
        network: impl Into<String>,
        platform: impl Into<String>,
        entity: EntityKind,
        row_count: usize,
    ) -> Self {
        Self {
            network: network.into(),
            platform: platform.into(),
            selected_entity: entity,
            entities: PerEntity::default(),
            available_values: None,
            loading_depth: 0,
            row_count: if row_count == 0 {
                DEFAULT_ROW_COUNT
            } else {
                row_count
            },
            modal: None,
            last_error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading_depth > 0
    }

    pub fn entity(&self, kind: EntityKind) -> &EntityData {
        self.entities.get(kind)
    }

    /// Data of the selected entity.
    pub fn current(&self) -> &EntityData {
        self.entities.get(self.selected_entity)
    }
}
