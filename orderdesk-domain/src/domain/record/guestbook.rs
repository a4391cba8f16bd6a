use super::{invalid_fields, missing_fields, trimmed, unexpected_row};
use crate::{Column, ColumnType, OrderdeskError, Record, Row, SqlValue, TableSchema};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const ENTRIES_TABLE: TableSchema = TableSchema {
    name: "entries",
    key: "id",
    columns: &[
        Column {
            name: "guest_name",
            r#type: ColumnType::Text { max_length: 50 },
        },
        Column {
            name: "message",
            r#type: ColumnType::Text { max_length: 255 },
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct GuestbookEntry {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub message: String,
}

/// Form fields posted by the guestbook page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignGuestbookRequest {
    pub name: Option<String>,
    pub message: Option<String>,
}

impl TryFrom<SignGuestbookRequest> for GuestbookEntry {
    type Error = OrderdeskError;

    fn try_from(request: SignGuestbookRequest) -> Result<Self, Self::Error> {
        let entry = match (trimmed(request.name), trimmed(request.message)) {
            (Some(name), Some(message)) => GuestbookEntry { name, message },
            (None, None) => return Err(missing_fields(&["name", "message"])),
            (None, _) => return Err(missing_fields(&["name"])),
            (_, None) => return Err(missing_fields(&["message"])),
        };

        entry.validate().map_err(invalid_fields)?;

        Ok(entry)
    }
}

impl Record for GuestbookEntry {
    const TABLE: &'static TableSchema = &ENTRIES_TABLE;

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.name.clone()),
            SqlValue::Text(self.message.clone()),
        ]
    }

    fn from_row(row: Row) -> Result<Self, OrderdeskError> {
        match <[SqlValue; 2]>::try_from(row.values) {
            Ok([SqlValue::Text(name), SqlValue::Text(message)]) => {
                Ok(GuestbookEntry { name, message })
            }
            _ => Err(unexpected_row(ENTRIES_TABLE.name)),
        }
    }
}
