use crate::{ErrorMeta, OrderdeskError};
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;

impl IntoResponse for OrderdeskError {
    fn into_response(self) -> Response {
        (&self).into_response()
    }
}

impl IntoResponse for &OrderdeskError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!(code = %self.code(), key = %self.key(), "{self}");
        }

        let status: StatusCode = self.into();

        (status, Json(self.as_json())).into_response()
    }
}
