// Cell formatting shared by the CLI tables, the TUI and CSV export.

use chrono::{DateTime, SecondsFormat};
use serde_json::Value;

use crate::model::DataType;

const MUTEZ_PER_TEZ: i128 = 1_000_000;

/// Machine-friendly cell text: strings verbatim, null empty, everything
/// else as compact JSON.
pub fn raw_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Human-friendly cell text for an attribute of the given type.
///
/// Epoch-millisecond timestamps become RFC 3339 UTC and currency amounts
/// (reported in mutez) become tez with six decimals.
pub fn display_value(value: &Value, data_type: Option<DataType>) -> String {
    match (data_type, value) {
        (Some(DataType::DateTime), Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map_or_else(|| n.to_string(), |ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        (Some(DataType::Currency), Value::Number(n)) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map_or_else(|| n.to_string(), format_tez),
        _ => raw_value(value),
    }
}

fn format_tez(mutez: i128) -> String {
    let sign = if mutez < 0 { "-" } else { "" };
    let abs = mutez.abs();
    format!(
        "{sign}{}.{:06} ꜩ",
        abs / MUTEZ_PER_TEZ,
        abs % MUTEZ_PER_TEZ
    )
}

/// Humanize a snake_case value for menus: `double_baking_evidence` → `Double baking evidence`.
pub fn humanize(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
