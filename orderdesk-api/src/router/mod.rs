use crate::{
    logic::{guestbook, orders, probe},
    server::AppState,
};
use axum::{response::IntoResponse, routing::get, Router};
use orderdesk_domain::ApplicationError;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn get_router(state: &Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(guestbook::list).post(guestbook::sign))
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/probe", get(probe::probe))
        .fallback(not_found_handler)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
}

pub async fn not_found_handler() -> impl IntoResponse {
    ApplicationError::not_found("Not found", Some("route"))
}
