//! The bulk write path.
//!
//! Records are generated in parallel ([`generator`]), staged into a columnar
//! [`TabularData`] through a static field mapping ([`stager`]), then either
//! streamed into their table with `COPY` ([`insert`]) or staged into a temp
//! table and merged with one set-based `UPDATE` ([`update`]).

pub mod config;
pub mod copy;
pub mod error;
pub mod faker;
pub mod generator;
pub mod insert;
pub mod schema;
pub mod session;
pub mod stager;
pub mod statements;
pub mod update;

pub use config::BulkConfig;
pub use copy::{BulkCopy, BulkCopyOptions, ColumnMapping, ProgressFn};
pub use error::{BulkError, BulkResult};
pub use generator::RecordGenerator;
pub use insert::{BulkCopyExecutor, BulkCopyReport};
pub use schema::{CellValue, ColumnDef, ColumnType, FieldMapping, TableSchema, TabularRecord};
pub use stager::{TabularColumn, TabularData, stage};
pub use update::{BulkUpdateExecutor, BulkUpdateReport};
