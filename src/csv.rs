//! CSV table rendering for row-per-record payloads.
//!
//! Columns are collected across all rows in first-seen order, so rows may
//! carry different key sets; missing cells come out empty.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Formatting knobs for [`render`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CsvOptions {
    pub row_separator: String,
    pub field_separator: String,
    pub with_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            row_separator: "\n".to_string(),
            field_separator: ",".to_string(),
            with_headers: true,
        }
    }
}

/// Renders rows of column-keyed values as CSV text.
///
/// Every line, the header row included, is joined with the configured field
/// separator and followed by the row separator. Cells containing the field
/// separator or a double quote are wrapped in double quotes with inner
/// quotes doubled.
pub fn render(rows: &[Map<String, Value>], options: &CsvOptions) -> String {
    let columns = collect_columns(rows);
    // No columns means no table, even when header output is on.
    if columns.is_empty() {
        return String::new();
    }

    let mut csv = String::new();
    if options.with_headers {
        let header: Vec<String> = columns
            .iter()
            .map(|col| escape(col, &options.field_separator))
            .collect();
        csv.push_str(&header.join(&options.field_separator));
        csv.push_str(&options.row_separator);
    }

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| {
                let text = row.get(*col).map(cell_text).unwrap_or_default();
                escape(&text, &options.field_separator)
            })
            .collect();
        csv.push_str(&cells.join(&options.field_separator));
        csv.push_str(&options.row_separator);
    }

    csv
}

/// Serializes arbitrary records to column maps, then renders them as CSV.
///
/// Each record must serialize to a JSON object; anything else fails with
/// [`Error::CsvRow`] naming the offending row index.
pub fn render_rows<T: Serialize>(rows: &[T], options: &CsvOptions) -> Result<String> {
    let mut maps = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match serde_json::to_value(row)? {
            Value::Object(map) => maps.push(map),
            _ => return Err(Error::CsvRow(index)),
        }
    }
    Ok(render(&maps, options))
}

fn collect_columns(rows: &[Map<String, Value>]) -> Vec<&str> {
    let mut columns = IndexSet::new();
    for row in rows {
        for key in row.keys() {
            columns.insert(key.as_str());
        }
    }
    columns.into_iter().collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested values keep their compact JSON form.
        other => other.to_string(),
    }
}

fn escape(text: &str, field_separator: &str) -> String {
    if text.contains(field_separator) || text.contains('"') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
