// src/page.rs - Rows, row metadata and pages handed back to the query host
use crate::schema::{self, Column};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::fmt;

// ============================================================================
// CELLS
// ============================================================================

/// Typed cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Timestamp(_) => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Cell::Timestamp(t) => Some(*t),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

// ============================================================================
// ROW METADATA
// ============================================================================

/// Reference to the element an alarm was raised on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementRef {
    pub backend_instance_id: i32,
    pub element_id: i32,
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.backend_instance_id, self.element_id)
    }
}

/// Reference to the parameter (and table row, if any) an alarm was raised on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamRef {
    pub backend_instance_id: i32,
    pub element_id: i32,
    pub parameter_id: i32,
    pub table_row_key: Option<String>,
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.backend_instance_id, self.element_id, self.parameter_id)?;
        match self.table_row_key.as_deref() {
            Some(key) if !key.is_empty() => write!(f, "/{}", key),
            _ => Ok(()),
        }
    }
}

/// Span from alarm creation to the latest arrival
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

/// Cross-reference metadata attached to every row.
///
/// Values are copied out of the alarm when the row is built; they never
/// track later changes on the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowMetadata {
    pub element: ElementRef,
    pub parameter: ParamRef,
    pub time_range: TimeRange,
}

// ============================================================================
// ROWS AND PAGES
// ============================================================================

/// One output row; `cells` follows [`schema::COLUMNS`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub metadata: RowMetadata,
}

impl Row {
    /// Cell for the given column, if the column belongs to the schema
    pub fn cell(&self, column: Column) -> Option<&Cell> {
        schema::COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|index| self.cells.get(index))
    }

    /// Text of the given column; empty for timestamps or unknown columns
    pub fn text(&self, column: Column) -> &str {
        self.cell(column).and_then(Cell::as_text).unwrap_or("")
    }

    /// Row as a JSON object keyed by column name
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (column, cell) in schema::COLUMNS.iter().zip(&self.cells) {
            object.insert(column.name.to_string(), serde_json::Value::String(cell.to_string()));
        }
        object.insert("element_ref".to_string(), self.metadata.element.to_string().into());
        object.insert("parameter_ref".to_string(), self.metadata.parameter.to_string().into());
        object.insert("start".to_string(), self.metadata.time_range.start.to_rfc3339().into());
        object.insert("end".to_string(), self.metadata.time_range.end.to_rfc3339().into());
        serde_json::Value::Object(object)
    }
}

/// Batch of rows returned by one page request
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Page {
    pub rows: Vec<Row>,
    pub has_next_page: bool,
}

impl Page {
    /// Page with no rows and no continuation
    pub fn empty() -> Self {
        Self::default()
    }

    /// Terminal page; this source never continues past one page
    pub fn last(rows: Vec<Row>) -> Self {
        Self { rows, has_next_page: false }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
