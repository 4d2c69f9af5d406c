//! Static table descriptions for record kinds that can travel through the
//! bulk path.
//!
//! A record kind declares two constants: the ordered field-to-column mapping
//! used to read values out of a record, and the destination table descriptor
//! used to name the columns the database expects. Both are plain data checked
//! by the compiler, so staging never inspects types at runtime.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;
use uuid::Uuid;

/// Column types understood by the staging structure and the copy encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Text,
    TimestampTz,
}

/// A single typed value held by a staged row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Uuid(Uuid),
    Text(String),
    TimestampTz(DateTime<Utc>),
}

impl CellValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            CellValue::Uuid(_) => ColumnType::Uuid,
            CellValue::Text(_) => ColumnType::Text,
            CellValue::TimestampTz(_) => ColumnType::TimestampTz,
        }
    }

    /// Append this value in PostgreSQL `COPY` text format.
    pub fn write_copy_text(&self, out: &mut String) {
        match self {
            CellValue::Uuid(id) => {
                let _ = write!(out, "{}", id.hyphenated());
            }
            CellValue::Text(text) => escape_copy_text(text, out),
            CellValue::TimestampTz(ts) => {
                out.push_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true));
            }
        }
    }
}

fn escape_copy_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // PostgreSQL text columns cannot store NUL.
            '\0' => {}
            other => out.push(other),
        }
    }
}

/// One destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self { name, column_type }
    }
}

/// Destination table descriptor, declared once per record kind.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: &'static str,
    /// Join key for set-based updates; never overwritten.
    pub key_column: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableSchema {
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|column| column.name)
    }

    /// Columns a set-based update writes: everything except the key.
    pub fn updatable_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.column_names()
            .filter(move |name| *name != self.key_column)
    }
}

/// Maps one record field to its column and reads its value.
pub struct FieldMapping<R> {
    pub column: &'static str,
    pub column_type: ColumnType,
    pub read: fn(&R) -> CellValue,
}

/// A record kind that can be staged and bulk written.
pub trait TabularRecord: Sized + 'static {
    /// Field mappings in field-declaration order.
    const FIELDS: &'static [FieldMapping<Self>];
    const SCHEMA: TableSchema;
}
