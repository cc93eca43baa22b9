//! Column inference for schema-less tabular payloads
//!
//! Report rows and CSV artifacts arrive as JSON objects with no declared
//! schema. Columns are derived at render time from the rows themselves.
//!
//! The default strategy looks at the first row only. Rows with keys the first
//! row lacks have those cells ignored; rows missing a key render a blank cell.
//! [`ColumnStrategy::Union`] trades that for a full scan of the rows.

use serde::Deserialize;
use serde_json::Value;

use crate::types::ReportRow;

/// A column of a dynamically inferred table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Key looked up in each row
    pub field: String,
    /// Text shown in the header
    pub header: String,
}

impl Column {
    fn from_key(key: &str) -> Self {
        Self {
            field: key.to_string(),
            header: key.to_string(),
        }
    }
}

/// How columns are derived from a row sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStrategy {
    /// Keys of the first row, in that row's order
    #[default]
    FirstRow,
    /// Keys of every row, in first-seen order
    Union,
}

/// Derive columns from the first row, preserving its key order.
///
/// An empty slice yields no columns; callers show a "no data" placeholder.
pub fn infer_columns(rows: &[ReportRow]) -> Vec<Column> {
    infer_columns_with(rows, ColumnStrategy::FirstRow)
}

/// Derive columns using an explicit strategy.
pub fn infer_columns_with(rows: &[ReportRow], strategy: ColumnStrategy) -> Vec<Column> {
    match strategy {
        ColumnStrategy::FirstRow => rows
            .first()
            .map(|row| row.keys().map(|k| Column::from_key(k)).collect())
            .unwrap_or_default(),
        ColumnStrategy::Union => {
            let mut seen: Vec<&str> = Vec::new();
            for row in rows {
                for key in row.keys() {
                    if !seen.contains(&key.as_str()) {
                        seen.push(key);
                    }
                }
            }
            seen.into_iter().map(Column::from_key).collect()
        }
    }
}

/// Display text for one cell.
///
/// Missing keys and `null` are blank, strings are shown verbatim, anything
/// else as compact JSON.
pub fn cell_text(row: &ReportRow, column: &Column) -> String {
    match row.get(&column.field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
