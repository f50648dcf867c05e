// CSV export of fetched rows.

use std::io;

use crate::display::raw_value;
use crate::error::CoreError;
use crate::model::{AttributeDefinition, Record};

/// Write `items` as CSV, one column per entry of `columns`, with a header row
/// of attribute names. Without columns, the keys of the first row are used.
///
/// Returns the number of data rows written.
pub fn write_csv<W: io::Write>(
    writer: W,
    columns: &[AttributeDefinition],
    items: &[Record],
) -> Result<usize, CoreError> {
    let headers: Vec<&str> = if columns.is_empty() {
        items
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    } else {
        columns.iter().map(|c| c.name.as_str()).collect()
    };

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&headers)?;
    for item in items {
        wtr.write_record(
            headers
                .iter()
                .map(|name| item.get(*name).map(raw_value).unwrap_or_default()),
        )?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(items.len())
}
