use crate::algebra::{Connection, RelationalStore};
use async_trait::async_trait;
use orderdesk_domain::{
    ColumnType, ConnectionDescriptor, InternalError, OrderdeskError, ReadOrder, Row, SqlValue,
    TableSchema, TransportOptions, Unit,
};
use secrecy::ExposeSecret;
use sqlx::{
    postgres::{PgConnectOptions, PgRow, PgSslMode},
    Connection as SqlxConnection, PgConnection, Postgres, Row as SqlxRow,
};

const DUPLICATE_TABLE: &str = "42P07";
// Raised on pg_type when two sessions race on CREATE TABLE IF NOT EXISTS.
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres through one unpooled `PgConnection` per unit of work.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresStore;

pub fn ssl_mode(transport: &TransportOptions) -> PgSslMode {
    match (transport.encrypt, transport.trust_server_certificate) {
        (false, _) => PgSslMode::Disable,
        (true, true) => PgSslMode::Require,
        (true, false) => PgSslMode::VerifyFull,
    }
}

#[async_trait]
impl RelationalStore for PostgresStore {
    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Connection>, OrderdeskError> {
        let options = PgConnectOptions::new()
            .host(descriptor.host())
            .port(descriptor.port())
            .username(descriptor.username())
            .password(descriptor.password().expose_secret())
            .database(descriptor.database())
            .ssl_mode(ssl_mode(descriptor.transport()));

        let connection = PgConnection::connect_with(&options).await.map_err(|e| {
            InternalError::connection_error(
                &format!("Failed to connect to {descriptor}: {e}"),
                Some("postgres"),
            )
        })?;

        Ok(Box::new(PostgresConnection {
            inner: Some(connection),
        }))
    }
}

pub struct PostgresConnection {
    inner: Option<PgConnection>,
}

impl PostgresConnection {
    fn connection(&mut self) -> Result<&mut PgConnection, OrderdeskError> {
        self.inner
            .as_mut()
            .ok_or_else(|| InternalError::connection_error("Connection is closed", None))
    }
}

fn quoted(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

pub fn create_table_statement(schema: &TableSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|column| match column.r#type {
            ColumnType::Text { max_length } => {
                format!("{} VARCHAR({max_length})", quoted(column.name))
            }
            ColumnType::Integer => format!("{} BIGINT", quoted(column.name)),
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} BIGSERIAL PRIMARY KEY, {columns})",
        quoted(schema.name),
        quoted(schema.key)
    )
}

pub fn insert_statement(schema: &TableSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|column| quoted(column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=schema.columns.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders}) RETURNING {}",
        quoted(schema.name),
        quoted(schema.key)
    )
}

pub fn select_statement(schema: &TableSchema, order: ReadOrder, limit: Option<u32>) -> String {
    let columns = std::iter::once(schema.key)
        .chain(schema.columns.iter().map(|column| column.name))
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ");
    let direction = match order {
        ReadOrder::NewestFirst => "DESC",
        ReadOrder::OldestFirst => "ASC",
    };
    let limit = if limit.is_some() { " LIMIT $1" } else { "" };

    format!(
        "SELECT {columns} FROM {} ORDER BY {} {direction}{limit}",
        quoted(schema.name),
        quoted(schema.key)
    )
}

fn is_already_exists(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => matches!(
            e.code().as_deref(),
            Some(DUPLICATE_TABLE) | Some(UNIQUE_VIOLATION)
        ),
        _ => false,
    }
}

fn query_error(table: &str, e: sqlx::Error) -> OrderdeskError {
    InternalError::query_error(&format!("Statement on {table} failed: {e}"), Some("postgres"))
}

fn decode_row(schema: &TableSchema, row: &PgRow) -> Result<Row, sqlx::Error> {
    let id = row.try_get::<i64, _>(0)?;
    let values = schema
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| match column.r#type {
            ColumnType::Text { .. } => row.try_get::<String, _>(i + 1).map(SqlValue::Text),
            ColumnType::Integer => row.try_get::<i64, _>(i + 1).map(SqlValue::Integer),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Row { id, values })
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn ensure_table(&mut self, schema: &TableSchema) -> Result<Unit, OrderdeskError> {
        let statement = create_table_statement(schema);

        match sqlx::query(&statement).execute(self.connection()?).await {
            Ok(_) => Ok(()),
            Err(e) if is_already_exists(&e) => {
                tracing::debug!("Table {} already exists", schema.name);
                Ok(())
            }
            Err(e) => Err(InternalError::schema_error(
                &format!("Failed to ensure table {}: {e}", schema.name),
                Some("postgres"),
            )),
        }
    }

    async fn insert(
        &mut self,
        schema: &TableSchema,
        values: Vec<SqlValue>,
    ) -> Result<i64, OrderdeskError> {
        let statement = insert_statement(schema);

        let query = values.into_iter().fold(
            sqlx::query_scalar::<Postgres, i64>(&statement),
            |query, value| match value {
                SqlValue::Text(text) => query.bind(text),
                SqlValue::Integer(integer) => query.bind(integer),
            },
        );

        query
            .fetch_one(self.connection()?)
            .await
            .map_err(|e| query_error(schema.name, e))
    }

    async fn select(
        &mut self,
        schema: &TableSchema,
        order: ReadOrder,
        limit: Option<u32>,
    ) -> Result<Vec<Row>, OrderdeskError> {
        let statement = select_statement(schema, order, limit);

        let query = sqlx::query::<Postgres>(&statement);
        let query = match limit {
            Some(limit) => query.bind(i64::from(limit)),
            None => query,
        };

        let rows = query
            .fetch_all(self.connection()?)
            .await
            .map_err(|e| query_error(schema.name, e))?;

        rows.iter()
            .map(|row| decode_row(schema, row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| query_error(schema.name, e))
    }

    async fn ping(&mut self) -> Result<Unit, OrderdeskError> {
        sqlx::query("SELECT 1")
            .execute(self.connection()?)
            .await
            .map(|_| ())
            .map_err(|e| query_error("probe", e))
    }

    async fn close(&mut self) -> Result<Unit, OrderdeskError> {
        match self.inner.take() {
            Some(connection) => connection.close().await.map_err(|e| {
                InternalError::connection_error(
                    &format!("Failed to close connection: {e}"),
                    Some("postgres"),
                )
            }),
            None => Ok(()),
        }
    }
}
