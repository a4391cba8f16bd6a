use crate::{server::AppState, service::records};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use http::StatusCode;
use orderdesk_domain::{
    ApplicationError, CreateOrderRequest, Order, OrderdeskError, ReadOrder, Stored,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), OrderdeskError> {
    let Json(payload) = payload.map_err(|e| {
        ApplicationError::validation_error(&e.body_text(), Some("payload"))
    })?;

    let order = Order::try_from(payload)?;

    let mut guard = state.bootstrap.guard().await?;
    let id = records::insert(&mut guard, &order).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Order inserted successfully!", "id": id })),
    ))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Stored<Order>>>, OrderdeskError> {
    let mut guard = state.bootstrap.guard().await?;

    records::read(
        &mut guard,
        ReadOrder::NewestFirst,
        Some(state.config.orders_read_limit),
    )
    .await
    .map(Json)
}
