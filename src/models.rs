use crate::bulk::schema::{CellValue, ColumnDef, ColumnType, FieldMapping, TableSchema, TabularRecord};
use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Customer =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

/// Column list shared by every query that materialises a full [`Customer`].
pub const CUSTOMER_SELECT_COLUMNS: &str =
    "id, first_name, last_name, email, contact_number, address, created_date, modified_date";

const CUSTOMER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", ColumnType::Uuid),
    ColumnDef::new("first_name", ColumnType::Text),
    ColumnDef::new("last_name", ColumnType::Text),
    ColumnDef::new("email", ColumnType::Text),
    ColumnDef::new("contact_number", ColumnType::Text),
    ColumnDef::new("address", ColumnType::Text),
    ColumnDef::new("created_date", ColumnType::TimestampTz),
    ColumnDef::new("modified_date", ColumnType::TimestampTz),
];

fn read_id(c: &Customer) -> CellValue {
    CellValue::Uuid(c.id)
}

fn read_first_name(c: &Customer) -> CellValue {
    CellValue::Text(c.first_name.clone())
}

fn read_last_name(c: &Customer) -> CellValue {
    CellValue::Text(c.last_name.clone())
}

fn read_email(c: &Customer) -> CellValue {
    CellValue::Text(c.email.clone())
}

fn read_contact_number(c: &Customer) -> CellValue {
    CellValue::Text(c.contact_number.clone())
}

fn read_address(c: &Customer) -> CellValue {
    CellValue::Text(c.address.clone())
}

fn read_created_date(c: &Customer) -> CellValue {
    CellValue::TimestampTz(c.created_date)
}

fn read_modified_date(c: &Customer) -> CellValue {
    CellValue::TimestampTz(c.modified_date)
}

impl TabularRecord for Customer {
    const FIELDS: &'static [FieldMapping<Self>] = &[
        FieldMapping { column: "id", column_type: ColumnType::Uuid, read: read_id },
        FieldMapping { column: "first_name", column_type: ColumnType::Text, read: read_first_name },
        FieldMapping { column: "last_name", column_type: ColumnType::Text, read: read_last_name },
        FieldMapping { column: "email", column_type: ColumnType::Text, read: read_email },
        FieldMapping { column: "contact_number", column_type: ColumnType::Text, read: read_contact_number },
        FieldMapping { column: "address", column_type: ColumnType::Text, read: read_address },
        FieldMapping { column: "created_date", column_type: ColumnType::TimestampTz, read: read_created_date },
        FieldMapping { column: "modified_date", column_type: ColumnType::TimestampTz, read: read_modified_date },
    ];

    const SCHEMA: TableSchema = TableSchema {
        table: "customers",
        key_column: "id",
        columns: CUSTOMER_COLUMNS,
    };
}

// ===== Response Wrappers =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Result of any write operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedRows {
    pub rows_affected: u64,
}

impl AffectedRows {
    pub fn new(rows_affected: u64) -> Self {
        Self { rows_affected }
    }
}
