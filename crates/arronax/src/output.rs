//! Output formatting: table, JSON, YAML, CSV, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one identifier per line.
//! Query results have no fixed shape, so they get their own renderers
//! driven by the attribute definitions of the requested columns.

use std::io::{self, IsTerminal, Write};

use tabled::builder::Builder;
use tabled::{Table, Tabled, settings::Style};

use arronax_core::display::{display_value, raw_value};
use arronax_core::export::write_csv;
use arronax_core::{AttributeDefinition, Record};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact` / `yaml`: serializes the original data via serde
/// - `csv`: the `Tabled` headers and fields
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Csv => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_tabled_csv(&rows)
        }
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted
/// string, since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Csv => Err(CliError::Validation {
            field: "output".into(),
            reason: "csv is only available for lists; use json or yaml".into(),
        }),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Render query results restricted to `columns`, in column order.
///
/// `plain` emits the `key_attribute` value of each row.
pub fn render_records(
    format: OutputFormat,
    columns: &[AttributeDefinition],
    items: &[Record],
    key_attribute: &str,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_record_table(columns, items)),
        OutputFormat::Json => render_json(&project(columns, items), false),
        OutputFormat::JsonCompact => render_json(&project(columns, items), true),
        OutputFormat::Yaml => render_yaml(&project(columns, items)),
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            write_csv(&mut buf, columns, items)?;
            Ok(String::from_utf8_lossy(&buf).trim_end().to_owned())
        }
        OutputFormat::Plain => Ok(items
            .iter()
            .map(|item| item.get(key_attribute).map(raw_value).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Two-column attribute/value view of one record, in attribute order.
pub fn render_record_detail(attributes: &[AttributeDefinition], item: &Record) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Attribute", "Value"]);
    for attr in attributes {
        if let Some(value) = item.get(&attr.name) {
            builder.push_record([
                attr.display_name.clone(),
                display_value(value, Some(attr.data_type)),
            ]);
        }
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_record_table(columns: &[AttributeDefinition], items: &[Record]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.display_name.clone()));
    for item in items {
        builder.push_record(columns.iter().map(|c| {
            item.get(&c.name)
                .map(|v| display_value(v, Some(c.data_type)))
                .unwrap_or_default()
        }));
    }
    builder.build().with(Style::rounded()).to_string()
}

fn render_tabled_csv<R: Tabled>(rows: &[R]) -> Result<String, CliError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(R::headers().iter().map(AsRef::<str>::as_ref))?;
    for row in rows {
        wtr.write_record(row.fields().iter().map(AsRef::<str>::as_ref))?;
    }
    let buf = wtr
        .into_inner()
        .map_err(|e| CliError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&buf).trim_end().to_owned())
}

/// Records reduced to the requested columns, keeping column order.
fn project(columns: &[AttributeDefinition], items: &[Record]) -> Vec<Record> {
    items
        .iter()
        .map(|item| {
            columns
                .iter()
                .filter_map(|c| item.get(&c.name).map(|v| (c.name.clone(), v.clone())))
                .collect()
        })
        .collect()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    Ok(if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    })
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
