use crate::{
    server::AppState,
    service::records,
    templates::{self, ERROR, GUESTBOOK},
};
use axum::{
    extract::{rejection::FormRejection, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use handlebars::Handlebars;
use http::StatusCode;
use orderdesk_domain::{
    ApplicationError, ErrorMeta, GuestbookEntry, InternalError, OrderdeskError, ReadOrder,
    SignGuestbookRequest,
};
use serde_json::json;
use std::sync::Arc;

const DATABASE_UNREACHABLE: &str =
    "Could not connect to the database. Check Key Vault and Managed Identity settings.";

pub async fn list(State(state): State<Arc<AppState>>) -> Result<Html<String>, HtmlError> {
    let page = async {
        let mut guard = state.bootstrap.guard().await?;
        let entries =
            records::read::<GuestbookEntry>(&mut guard, ReadOrder::NewestFirst, None).await?;

        templates::render(&state.templates, GUESTBOOK, &json!({ "entries": entries }))
    };

    page.await
        .map(Html)
        .map_err(|e| HtmlError::new(e, &state.templates))
}

pub async fn sign(
    State(state): State<Arc<AppState>>,
    payload: Result<Form<SignGuestbookRequest>, FormRejection>,
) -> Result<Redirect, HtmlError> {
    let signed = async {
        let Form(payload) = payload.map_err(|e| {
            ApplicationError::validation_error(&e.body_text(), Some("payload"))
        })?;

        let entry = GuestbookEntry::try_from(payload)?;

        let mut guard = state.bootstrap.guard().await?;
        records::insert(&mut guard, &entry).await
    };

    signed
        .await
        .map(|_| Redirect::to("/"))
        .map_err(|e| HtmlError::new(e, &state.templates))
}

/// An error rendered as the guestbook error page instead of JSON.
pub struct HtmlError {
    error: OrderdeskError,
    templates: Arc<Handlebars<'static>>,
}

impl HtmlError {
    pub fn new(error: OrderdeskError, templates: &Arc<Handlebars<'static>>) -> Self {
        Self {
            error,
            templates: templates.clone(),
        }
    }

    fn message(&self) -> String {
        match &self.error {
            OrderdeskError::Application(e) => e.message().to_string(),
            OrderdeskError::Internal(
                InternalError::ConfigurationError { .. }
                | InternalError::AuthenticationError { .. }
                | InternalError::SecretNotFound { .. }
                | InternalError::ConnectionError { .. }
                | InternalError::IOErr { .. },
            ) => DATABASE_UNREACHABLE.to_string(),
            OrderdeskError::Internal(e) => e.public_message().to_string(),
        }
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        if self.error.is_internal() {
            tracing::error!(code = %self.error.code(), key = %self.error.key(), "{}", self.error);
        }

        let status: StatusCode = (&self.error).into();
        let message = self.message();
        let title = if status.is_client_error() {
            "Invalid entry"
        } else {
            "Something went wrong"
        };

        let body = templates::render(
            &self.templates,
            ERROR,
            &json!({ "title": title, "message": message }),
        )
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to a plain error page: {e}");
            format!("<p>{}</p>", handlebars::html_escape(&message))
        });

        (status, Html(body)).into_response()
    }
}
