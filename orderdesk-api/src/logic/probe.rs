use crate::{server::AppState, service::records};
use axum::{extract::State, Json};
use orderdesk_domain::OrderdeskError;
use serde_json::{json, Value};
use std::sync::Arc;

/// Bootstraps a connection and runs `SELECT 1`.
pub async fn probe(State(state): State<Arc<AppState>>) -> Result<Json<Value>, OrderdeskError> {
    let mut guard = state.bootstrap.guard().await?;
    records::probe(&mut guard).await?;

    Ok(Json(json!({ "success": true })))
}
