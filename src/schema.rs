// src/schema.rs - Column layout reported to the query host
use serde::Serialize;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Free text
    String,
    /// UTC timestamp
    DateTime,
}

/// Column descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
}

impl Column {
    const fn string(name: &'static str) -> Self {
        Self { name, kind: ColumnType::String }
    }

    const fn datetime(name: &'static str) -> Self {
        Self { name, kind: ColumnType::DateTime }
    }
}

pub const ID: Column = Column::string("ID");
pub const ELEMENT: Column = Column::string("Element");
pub const PARAMETER: Column = Column::string("Parameter");
pub const VALUE: Column = Column::string("Value");
pub const TIME: Column = Column::datetime("Time");
pub const SEVERITY: Column = Column::string("Severity");
pub const ANOMALY_TYPE: Column = Column::string("Anomaly Type");
pub const GUID: Column = Column::string("Guid");

/// Every row carries one cell per column, in this order.
pub const COLUMNS: [Column; 8] = [ID, ELEMENT, PARAMETER, VALUE, TIME, SEVERITY, ANOMALY_TYPE, GUID];

/// Fixed column layout of the anomaly alarm view
pub fn columns() -> &'static [Column] {
    &COLUMNS
}
