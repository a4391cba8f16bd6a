use async_trait::async_trait;
use orderdesk_domain::{
    ConnectionDescriptor, OrderdeskError, ReadOrder, Row, SqlValue, TableSchema, Unit,
};

/// A relational database reachable through a [`ConnectionDescriptor`].
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Opens one connection. Callers bound the attempt with the descriptor timeout.
    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, OrderdeskError>;
}

#[async_trait]
pub trait Connection: Send {
    /// `CREATE TABLE IF NOT EXISTS`. A table that already exists, including one
    /// created concurrently by another connection, is not an error.
    async fn ensure_table(&mut self, schema: &TableSchema) -> Result<Unit, OrderdeskError>;

    /// Inserts one row with bound parameters and returns the assigned id.
    async fn insert(
        &mut self,
        schema: &TableSchema,
        values: Vec<SqlValue>,
    ) -> Result<i64, OrderdeskError>;

    async fn select(
        &mut self,
        schema: &TableSchema,
        order: ReadOrder,
        limit: Option<u32>,
    ) -> Result<Vec<Row>, OrderdeskError>;

    async fn ping(&mut self) -> Result<Unit, OrderdeskError>;

    async fn close(&mut self) -> Result<Unit, OrderdeskError>;
}
