use super::guard::ConnectionGuard;
use orderdesk_domain::{OrderdeskError, ReadOrder, Record, Stored, TableSchema, Unit};

/// Validates and inserts a record, creating its table first if needed.
/// An invalid record fails before the guard connects.
pub async fn insert<R: Record>(
    guard: &mut ConnectionGuard,
    record: &R,
) -> Result<i64, OrderdeskError> {
    record.check()?;

    let values = record.values();

    let id = guard
        .run(Some(R::TABLE), move |conn| {
            Box::pin(async move { conn.insert(R::TABLE, values).await })
        })
        .await?;

    tracing::debug!("Inserted row {id} into {}", R::TABLE.name);

    Ok(id)
}

pub async fn read<R: Record>(
    guard: &mut ConnectionGuard,
    order: ReadOrder,
    limit: Option<u32>,
) -> Result<Vec<Stored<R>>, OrderdeskError> {
    let rows = guard
        .run(Some(R::TABLE), move |conn| {
            Box::pin(async move { conn.select(R::TABLE, order, limit).await })
        })
        .await?;

    rows.into_iter()
        .map(|row| {
            let id = row.id;
            R::from_row(row).map(|record| Stored { id, record })
        })
        .collect()
}

pub async fn ensure_schema(
    guard: &mut ConnectionGuard,
    schemas: &'static [&'static TableSchema],
) -> Result<Unit, OrderdeskError> {
    guard
        .run(None, move |conn| {
            Box::pin(async move {
                for schema in schemas {
                    conn.ensure_table(schema).await?;
                }
                Ok::<_, OrderdeskError>(())
            })
        })
        .await
}

pub async fn probe(guard: &mut ConnectionGuard) -> Result<Unit, OrderdeskError> {
    guard
        .run(None, |conn| Box::pin(async move { conn.ping().await }))
        .await
}
