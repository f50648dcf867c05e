use serde::{Deserialize, Serialize};

use arronax_api::{DataType, Operation, SortDirection};

/// A predicate the user attached to an attribute of the selected entity.
///
/// The value set lives separately in the per-entity selected values, keyed by
/// `attribute`, so a filter can exist before a value is picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub attribute: String,
    pub operator: Operation,
    /// Negate the predicate (`not eq`, `not in`, ...).
    #[serde(default)]
    pub inverse: bool,
}

impl Filter {
    pub fn new(attribute: impl Into<String>, operator: Operation) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            inverse: false,
        }
    }

    /// Whether this filter can be sent without a selected value.
    pub fn needs_value(&self) -> bool {
        self.operator.arity() != Some(0)
    }
}

/// Table sort state: the attribute ordered by and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub order_by: String,
    pub order: SortDirection,
}

impl Sort {
    pub fn desc(order_by: impl Into<String>) -> Self {
        Self {
            order_by: order_by.into(),
            order: SortDirection::Desc,
        }
    }

    /// Header click rule: a column already sorted descending flips to
    /// ascending; anything else sorts descending.
    pub fn toggle(current: Option<&Sort>, column: &str) -> Sort {
        let order = match current {
            Some(sort) if sort.order_by == column && sort.order == SortDirection::Desc => {
                SortDirection::Asc
            }
            _ => SortDirection::Desc,
        };
        Sort {
            order_by: column.to_owned(),
            order,
        }
    }
}

/// Operators offered for an attribute of the given type.
pub fn operators_for(data_type: DataType) -> &'static [Operation] {
    match data_type {
        DataType::Int | DataType::LargeInt | DataType::Decimal | DataType::Currency => &[
            Operation::Eq,
            Operation::Gt,
            Operation::Lt,
            Operation::Between,
            Operation::In,
            Operation::Isnull,
        ],
        DataType::DateTime => &[
            Operation::Eq,
            Operation::Before,
            Operation::After,
            Operation::Between,
            Operation::In,
            Operation::Isnull,
        ],
        DataType::Boolean => &[Operation::Eq, Operation::Isnull],
        DataType::String | DataType::Hash | DataType::AccountAddress | DataType::Unknown => &[
            Operation::Eq,
            Operation::In,
            Operation::Like,
            Operation::StartsWith,
            Operation::EndsWith,
            Operation::Isnull,
        ],
    }
}
