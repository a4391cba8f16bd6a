pub mod guestbook;
pub mod order;

pub use guestbook::*;
pub use order::*;

use crate::{ApplicationError, OrderdeskError, Unit};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text { max_length: u16 },
    Integer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub r#type: ColumnType,
}

/// A flat table with a store-assigned surrogate key followed by `columns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub key: &'static str,
    pub columns: &'static [Column],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
    pub values: Vec<SqlValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ReadOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// A record type persisted in exactly one table, in column order.
pub trait Record: Validate + Sized + Send + Sync + 'static {
    const TABLE: &'static TableSchema;

    fn values(&self) -> Vec<SqlValue>;

    fn from_row(row: Row) -> Result<Self, OrderdeskError>;

    /// Rejects field values the table cannot hold.
    fn check(&self) -> Result<Unit, OrderdeskError> {
        self.validate().map_err(invalid_fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stored<R> {
    pub id: i64,
    #[serde(flatten)]
    pub record: R,
}

pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub(crate) fn missing_fields(fields: &[&str]) -> OrderdeskError {
    ApplicationError::validation_error(
        &format!("Missing required fields: {}", fields.join(", ")),
        Some("missing_fields"),
    )
}

pub(crate) fn invalid_fields(errors: ValidationErrors) -> OrderdeskError {
    let mut fields: Vec<&str> = errors.field_errors().into_keys().collect();
    fields.sort_unstable();

    ApplicationError::validation_error(
        &format!("Invalid fields: {}", fields.join(", ")),
        Some("invalid_fields"),
    )
}

pub(crate) fn unexpected_row(table: &str) -> OrderdeskError {
    crate::InternalError::deserialize_error(
        &format!("Row read from {table} does not match its schema"),
        None,
    )
}
