use super::{invalid_fields, missing_fields, trimmed, unexpected_row};
use crate::{Column, ColumnType, OrderdeskError, Record, Row, SqlValue, TableSchema};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const ORDERS_TABLE: TableSchema = TableSchema {
    name: "orders",
    key: "id",
    columns: &[
        Column {
            name: "customer_name",
            r#type: ColumnType::Text { max_length: 100 },
        },
        Column {
            name: "item",
            r#type: ColumnType::Text { max_length: 100 },
        },
        Column {
            name: "quantity",
            r#type: ColumnType::Integer,
        },
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Order {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub item: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// Body of `POST /api/orders`. Every field is optional here so that a missing
/// one is reported as a validation failure rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    pub name: Option<String>,
    pub item: Option<String>,
    pub quantity: Option<i64>,
}

impl TryFrom<CreateOrderRequest> for Order {
    type Error = OrderdeskError;

    fn try_from(request: CreateOrderRequest) -> Result<Self, Self::Error> {
        let name = trimmed(request.name);
        let item = trimmed(request.item);

        let (name, item, quantity) = match (name, item, request.quantity) {
            (Some(name), Some(item), Some(quantity)) => (name, item, quantity),
            (name, item, quantity) => {
                let missing: Vec<&str> = [
                    ("name", name.is_none()),
                    ("item", item.is_none()),
                    ("quantity", quantity.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, absent)| absent.then_some(field))
                .collect();

                return Err(missing_fields(&missing));
            }
        };

        let order = Order {
            name,
            item,
            quantity,
        };
        order.validate().map_err(invalid_fields)?;

        Ok(order)
    }
}

impl Record for Order {
    const TABLE: &'static TableSchema = &ORDERS_TABLE;

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(self.name.clone()),
            SqlValue::Text(self.item.clone()),
            SqlValue::Integer(self.quantity),
        ]
    }

    fn from_row(row: Row) -> Result<Self, OrderdeskError> {
        match <[SqlValue; 3]>::try_from(row.values) {
            Ok([SqlValue::Text(name), SqlValue::Text(item), SqlValue::Integer(quantity)]) => {
                Ok(Order {
                    name,
                    item,
                    quantity,
                })
            }
            _ => Err(unexpected_row(ORDERS_TABLE.name)),
        }
    }
}
