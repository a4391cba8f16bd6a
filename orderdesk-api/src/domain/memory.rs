use crate::algebra::{Connection, RelationalStore};
use async_trait::async_trait;
use orderdesk_domain::{
    ColumnType, ConnectionDescriptor, InternalError, OrderdeskError, ReadOrder, Row, SqlValue,
    TableSchema, Unit,
};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct State {
    tables: Mutex<HashMap<&'static str, Table>>,
    connects: AtomicUsize,
    closes: AtomicUsize,
    reject_connections: AtomicBool,
}

impl State {
    fn tables(&self) -> Result<MutexGuard<'_, HashMap<&'static str, Table>>, OrderdeskError> {
        self.tables
            .lock()
            .map_err(|_| InternalError::unknown("In-memory store lock was poisoned", None))
    }
}

/// Relational store kept in process memory. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent connect attempt fails with a connection error.
    pub fn reject_connections(&self, reject: bool) {
        self.state.reject_connections.store(reject, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.state
            .tables()
            .map(|tables| tables.contains_key(table))
            .unwrap_or(false)
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.state
            .tables()
            .map(|tables| tables.get(table).map_or(0, |t| t.rows.len()))
            .unwrap_or(0)
    }
}

#[async_trait]
impl RelationalStore for InMemoryStore {
    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, OrderdeskError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);

        if self.state.reject_connections.load(Ordering::SeqCst) {
            return Err(InternalError::connection_error(
                &format!("Connection to {descriptor} was refused"),
                Some("memory"),
            ));
        }

        Ok(Box::new(InMemoryConnection {
            state: self.state.clone(),
            open: true,
        }))
    }
}

struct InMemoryConnection {
    state: Arc<State>,
    open: bool,
}

impl InMemoryConnection {
    fn ensure_open(&self) -> Result<Unit, OrderdeskError> {
        if self.open {
            Ok(())
        } else {
            Err(InternalError::connection_error("Connection is closed", None))
        }
    }
}

fn check_values(schema: &TableSchema, values: &[SqlValue]) -> Result<Unit, OrderdeskError> {
    if values.len() != schema.columns.len() {
        return Err(InternalError::query_error(
            &format!(
                "INSERT into {} has {} values for {} columns",
                schema.name,
                values.len(),
                schema.columns.len()
            ),
            Some("memory"),
        ));
    }

    for (column, value) in schema.columns.iter().zip(values) {
        match (column.r#type, value) {
            (ColumnType::Text { max_length }, SqlValue::Text(text))
                if text.chars().count() > usize::from(max_length) =>
            {
                return Err(InternalError::query_error(
                    &format!(
                        "Value too long for column {} of type VARCHAR({max_length})",
                        column.name
                    ),
                    Some("memory"),
                ));
            }
            (ColumnType::Text { .. }, SqlValue::Text(_))
            | (ColumnType::Integer, SqlValue::Integer(_)) => {}
            _ => {
                return Err(InternalError::query_error(
                    &format!("Wrong value type for column {}", column.name),
                    Some("memory"),
                ));
            }
        }
    }

    Ok(())
}

fn missing_table(schema: &TableSchema) -> OrderdeskError {
    InternalError::query_error(
        &format!("Relation {} does not exist", schema.name),
        Some("memory"),
    )
}

#[async_trait]
impl Connection for InMemoryConnection {
    async fn ensure_table(&mut self, schema: &TableSchema) -> Result<Unit, OrderdeskError> {
        self.ensure_open()?;
        self.state.tables()?.entry(schema.name).or_default();
        Ok(())
    }

    async fn insert(
        &mut self,
        schema: &TableSchema,
        values: Vec<SqlValue>,
    ) -> Result<i64, OrderdeskError> {
        self.ensure_open()?;
        check_values(schema, &values)?;

        let mut tables = self.state.tables()?;
        let table = tables
            .get_mut(schema.name)
            .ok_or_else(|| missing_table(schema))?;

        table.last_id += 1;
        table.rows.push(Row {
            id: table.last_id,
            values,
        });

        Ok(table.last_id)
    }

    async fn select(
        &mut self,
        schema: &TableSchema,
        order: ReadOrder,
        limit: Option<u32>,
    ) -> Result<Vec<Row>, OrderdeskError> {
        self.ensure_open()?;

        let tables = self.state.tables()?;
        let table = tables.get(schema.name).ok_or_else(|| missing_table(schema))?;

        let mut rows = table.rows.clone();
        match order {
            ReadOrder::NewestFirst => rows.sort_by(|a, b| b.id.cmp(&a.id)),
            ReadOrder::OldestFirst => rows.sort_by(|a, b| a.id.cmp(&b.id)),
        }
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }

        Ok(rows)
    }

    async fn ping(&mut self) -> Result<Unit, OrderdeskError> {
        self.ensure_open()
    }

    async fn close(&mut self) -> Result<Unit, OrderdeskError> {
        if std::mem::take(&mut self.open) {
            self.state.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_domain::{database::DatabaseConfig, SecretBundle, ORDERS_TABLE};
    use secrecy::SecretString;

    fn descriptor() -> ConnectionDescriptor {
        let bundle = SecretBundle::from_connection_string(SecretString::new(
            "Server=memory;Database=orders;User ID=sa;Password=p".to_owned(),
        ));
        ConnectionDescriptor::from_bundle(&bundle, &DatabaseConfig::new())
            .expect("Failed to build descriptor")
    }

    fn order(name: &str) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(name.to_owned()),
            SqlValue::Text("Widget".to_owned()),
            SqlValue::Integer(1),
        ]
    }

    #[tokio::test]
    async fn test_ensure_table_twice() {
        let store = InMemoryStore::new();
        let mut connection = store.connect(&descriptor()).await.expect("Failed to connect");

        connection
            .ensure_table(&ORDERS_TABLE)
            .await
            .expect("Failed to ensure table");
        connection
            .ensure_table(&ORDERS_TABLE)
            .await
            .expect("Failed to ensure table again");

        assert!(store.table_exists("orders"));
    }

    #[tokio::test]
    async fn test_insert_requires_table() {
        let store = InMemoryStore::new();
        let mut connection = store.connect(&descriptor()).await.expect("Failed to connect");

        let err = connection
            .insert(&ORDERS_TABLE, order("Alice"))
            .await
            .expect_err("Expected a missing table");

        assert!(matches!(
            err,
            OrderdeskError::Internal(InternalError::QueryError { .. })
        ));
    }

    #[tokio::test]
    async fn test_select_order_and_limit() {
        let store = InMemoryStore::new();
        let mut connection = store.connect(&descriptor()).await.expect("Failed to connect");
        connection
            .ensure_table(&ORDERS_TABLE)
            .await
            .expect("Failed to ensure table");

        for name in ["a", "b", "c"] {
            connection
                .insert(&ORDERS_TABLE, order(name))
                .await
                .expect("Failed to insert");
        }

        let newest = connection
            .select(&ORDERS_TABLE, ReadOrder::NewestFirst, Some(2))
            .await
            .expect("Failed to select");
        let oldest = connection
            .select(&ORDERS_TABLE, ReadOrder::OldestFirst, None)
            .await
            .expect("Failed to select");

        assert_eq!(newest.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(oldest.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_rejected_connections_are_counted() {
        let store = InMemoryStore::new();
        store.reject_connections(true);

        let err = store
            .connect(&descriptor())
            .await
            .err()
            .expect("Expected the connection to be refused");

        assert!(matches!(
            err,
            OrderdeskError::Internal(InternalError::ConnectionError { .. })
        ));
        assert_eq!(store.connects(), 1);
        assert_eq!(store.closes(), 0);
    }

    #[tokio::test]
    async fn test_close_is_counted_once() {
        let store = InMemoryStore::new();
        let mut connection = store.connect(&descriptor()).await.expect("Failed to connect");

        connection.close().await.expect("Failed to close");
        connection.close().await.expect("Failed to close");

        assert_eq!(store.closes(), 1);
        assert!(connection.ping().await.is_err());
    }
}
