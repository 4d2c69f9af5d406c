//! Columnar staging of records ahead of a bulk copy.

use crate::bulk::error::{BulkError, BulkResult};
use crate::bulk::schema::{CellValue, ColumnType, TabularRecord};

/// A named, typed column of a [`TabularData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularColumn {
    pub name: &'static str,
    pub column_type: ColumnType,
}

/// In-memory transfer structure: ordered typed columns plus rows of values.
///
/// Every row holds exactly one value per column and each value's type matches
/// its column.
#[derive(Debug, Clone, Default)]
pub struct TabularData {
    columns: Vec<TabularColumn>,
    rows: Vec<Vec<CellValue>>,
}

impl TabularData {
    pub fn columns(&self) -> &[TabularColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }
}

/// Stage `records` into a [`TabularData`] using the record kind's field mapping.
pub fn stage<R: TabularRecord>(records: &[R]) -> BulkResult<TabularData> {
    if records.is_empty() {
        return Err(BulkError::EmptyInput);
    }

    let columns: Vec<TabularColumn> = R::FIELDS
        .iter()
        .map(|field| TabularColumn {
            name: field.column,
            column_type: field.column_type,
        })
        .collect();

    let rows: Vec<Vec<CellValue>> = records
        .iter()
        .map(|record| R::FIELDS.iter().map(|field| (field.read)(record)).collect())
        .collect();

    debug_assert!(rows.iter().all(|row| {
        row.iter()
            .zip(&columns)
            .all(|(value, column)| value.column_type() == column.column_type)
    }));

    log::trace!("staged {} rows x {} columns", rows.len(), columns.len());

    Ok(TabularData { columns, rows })
}
