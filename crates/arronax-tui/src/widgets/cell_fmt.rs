//! Table cell text for Conseil record values.

use serde_json::Value;

use arronax_core::display::display_value;
use arronax_core::{AttributeDefinition, DataType};

/// Placeholder for null or missing values.
pub const EMPTY_CELL: &str = "─";

/// Width long hashes and addresses are cut down to in table cells.
pub const HASH_WIDTH: usize = 15;

/// Cell text for one attribute of a record: null as [`EMPTY_CELL`],
/// timestamps and amounts humanized, long hashes shortened in the middle.
pub fn format_cell(value: Option<&Value>, attribute: &AttributeDefinition) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_owned(),
        Some(value) => {
            let text = display_value(value, Some(attribute.data_type));
            if matches!(attribute.data_type, DataType::Hash | DataType::AccountAddress) {
                shorten_middle(&text, HASH_WIDTH)
            } else {
                text
            }
        }
    }
}

/// Full-width text for the record modal. Nothing is shortened there.
pub fn format_detail(value: Option<&Value>, attribute: &AttributeDefinition) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_owned(),
        Some(value) => display_value(value, Some(attribute.data_type)),
    }
}

/// Keep the head and tail of `text` around a `…` so the result is at most
/// `max` characters.
pub fn shorten_middle(text: &str, max: usize) -> String {
    let len = text.chars().count();
    if len <= max || max < 3 {
        return text.to_owned();
    }
    let keep = max - 1;
    let head = keep.div_ceil(2);
    let tail = keep - head;

    let mut out: String = text.chars().take(head).collect();
    out.push('…');
    out.extend(text.chars().skip(len - tail));
    out
}
