#[cfg(feature = "axum-error")]
pub mod axum_error;

use http::StatusCode;
use serde::Serialize;
use std::convert::AsRef;
use std::{
    error::Error as StdError,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
};
use strum::AsRefStr;
use thiserror::Error as ThisError;

pub trait ErrorMeta {
    fn code(&self) -> ErrorCode;
    fn key(&self) -> ErrorKey;
    fn message(&self) -> ErrorMessage;
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorKey(String);

impl ErrorKey {
    pub fn internal(key: &str, subtype: Option<&str>) -> Self {
        if let Some(subtype) = subtype {
            ErrorKey(format!("err::internal::{}::{}", key, subtype))
        } else {
            ErrorKey(format!("err::internal::{}", key))
        }
    }

    pub fn application(key: &str, subtype: Option<&str>) -> Self {
        if let Some(subtype) = subtype {
            ErrorKey(format!("err::application::{}::{}", key, subtype))
        } else {
            ErrorKey(format!("err::application::{}", key))
        }
    }
}

impl Display for ErrorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
pub struct ErrorMessage(String);

impl AsRef<str> for ErrorMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Faults raised by the bootstrap chain or the store. Their messages may carry
/// operational detail and are only ever logged, never returned to a client.
#[derive(ThisError, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "PascalCase")]
pub enum InternalError {
    #[error("An unknown error occurred: {}", .message)]
    UnknownError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Configuration error: {}", .message)]
    ConfigurationError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Authentication error: {}", .message)]
    AuthenticationError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Secret not found: {}", .message)]
    SecretNotFound {
        message: String,
        subtype: Option<String>,
    },
    #[error("A connection error occurred: {}", .message)]
    ConnectionError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Schema error: {}", .message)]
    SchemaError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Query error: {}", .message)]
    QueryError {
        message: String,
        subtype: Option<String>,
    },
    #[error("An error while performing an IO operation: {}", .message)]
    IOErr {
        message: String,
        subtype: Option<String>,
    },
    #[error("Serialization error: {}", .message)]
    SerializeError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Deserialization error: {}", .message)]
    DeserializeError {
        message: String,
        subtype: Option<String>,
    },
}

impl From<anyhow::Error> for InternalError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<InternalError>() {
            Some(internal_error) => internal_error.clone(),
            None => InternalError::UnknownError {
                message: error.to_string(),
                subtype: None,
            },
        }
    }
}

impl InternalError {
    pub fn unknown(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::UnknownError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn configuration_error(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::ConfigurationError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn authentication_error(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::AuthenticationError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn secret_not_found(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::SecretNotFound {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn connection_error(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::ConnectionError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn schema_error(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::SchemaError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn query_error(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::QueryError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn io_err(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::IOErr {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn serialize_error(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::SerializeError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn deserialize_error(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::internal(InternalError::DeserializeError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    /// Message safe to show to a client. Never includes the underlying detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            InternalError::ConfigurationError { .. } => {
                "The service is not configured to reach its secret store"
            }
            InternalError::AuthenticationError { .. } => {
                "Could not authenticate against the secret store"
            }
            InternalError::SecretNotFound { .. } => {
                "A required secret is missing from the secret store"
            }
            InternalError::ConnectionError { .. } => "Could not connect to the database",
            InternalError::SchemaError { .. } => "Could not prepare the database schema",
            InternalError::QueryError { .. } => "The database rejected the request",
            InternalError::IOErr { .. } => "The secret store could not be reached",
            InternalError::UnknownError { .. }
            | InternalError::SerializeError { .. }
            | InternalError::DeserializeError { .. } => "An unknown error occurred",
        }
    }
}

impl ErrorMeta for InternalError {
    fn code(&self) -> ErrorCode {
        match self {
            InternalError::UnknownError { .. } => ErrorCode(1000),
            InternalError::ConfigurationError { .. } => ErrorCode(1001),
            InternalError::AuthenticationError { .. } => ErrorCode(1002),
            InternalError::SecretNotFound { .. } => ErrorCode(1003),
            InternalError::ConnectionError { .. } => ErrorCode(1004),
            InternalError::SchemaError { .. } => ErrorCode(1005),
            InternalError::QueryError { .. } => ErrorCode(1006),
            InternalError::IOErr { .. } => ErrorCode(1007),
            InternalError::SerializeError { .. } => ErrorCode(1008),
            InternalError::DeserializeError { .. } => ErrorCode(1009),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            InternalError::UnknownError { subtype, .. } => {
                ErrorKey::internal("unknown", subtype.as_deref())
            }
            InternalError::ConfigurationError { subtype, .. } => {
                ErrorKey::internal("configuration_error", subtype.as_deref())
            }
            InternalError::AuthenticationError { subtype, .. } => {
                ErrorKey::internal("authentication_error", subtype.as_deref())
            }
            InternalError::SecretNotFound { subtype, .. } => {
                ErrorKey::internal("secret_not_found", subtype.as_deref())
            }
            InternalError::ConnectionError { subtype, .. } => {
                ErrorKey::internal("connection_error", subtype.as_deref())
            }
            InternalError::SchemaError { subtype, .. } => {
                ErrorKey::internal("schema_error", subtype.as_deref())
            }
            InternalError::QueryError { subtype, .. } => {
                ErrorKey::internal("query_error", subtype.as_deref())
            }
            InternalError::IOErr { subtype, .. } => {
                ErrorKey::internal("io_err", subtype.as_deref())
            }
            InternalError::SerializeError { subtype, .. } => {
                ErrorKey::internal("serialize_error", subtype.as_deref())
            }
            InternalError::DeserializeError { subtype, .. } => {
                ErrorKey::internal("deserialize_error", subtype.as_deref())
            }
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            InternalError::UnknownError { message, .. }
            | InternalError::ConfigurationError { message, .. }
            | InternalError::AuthenticationError { message, .. }
            | InternalError::SecretNotFound { message, .. }
            | InternalError::ConnectionError { message, .. }
            | InternalError::SchemaError { message, .. }
            | InternalError::QueryError { message, .. }
            | InternalError::IOErr { message, .. }
            | InternalError::SerializeError { message, .. }
            | InternalError::DeserializeError { message, .. } => ErrorMessage(message.to_string()),
        }
    }
}

impl Debug for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}\n", &self)?;
        let mut current = self.source();

        while let Some(cause) = current {
            writeln!(f, "Caused by:\n\t{}", cause)?;
            current = cause.source();
        }

        Ok(())
    }
}

/// Faults the client can see and, for validation, correct.
#[derive(ThisError, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "PascalCase")]
pub enum ApplicationError {
    #[error("Validation error: {}", .message)]
    ValidationError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Not Found: {}", .message)]
    NotFound {
        message: String,
        subtype: Option<String>,
    },
    #[error("Internal Server Error: {}", .message)]
    InternalServerError {
        message: String,
        subtype: Option<String>,
    },
}

impl From<anyhow::Error> for ApplicationError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<ApplicationError>() {
            Some(application_error) => application_error.clone(),
            None => ApplicationError::InternalServerError {
                message: error.to_string(),
                subtype: None,
            },
        }
    }
}

impl ApplicationError {
    pub fn validation_error(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::application(ApplicationError::ValidationError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }

    pub fn not_found(message: &str, subtype: Option<&str>) -> OrderdeskError {
        OrderdeskError::application(ApplicationError::NotFound {
            message: message.to_string(),
            subtype: subtype.map(|s| s.to_string()),
        })
    }
}

impl ErrorMeta for ApplicationError {
    fn code(&self) -> ErrorCode {
        match self {
            ApplicationError::ValidationError { .. } => ErrorCode(2000),
            ApplicationError::NotFound { .. } => ErrorCode(2001),
            ApplicationError::InternalServerError { .. } => ErrorCode(2002),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            ApplicationError::ValidationError { subtype, .. } => {
                ErrorKey::application("validation_error", subtype.as_deref())
            }
            ApplicationError::NotFound { subtype, .. } => {
                ErrorKey::application("not_found", subtype.as_deref())
            }
            ApplicationError::InternalServerError { subtype, .. } => {
                ErrorKey::application("internal_server_error", subtype.as_deref())
            }
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            ApplicationError::ValidationError { message, .. }
            | ApplicationError::NotFound { message, .. }
            | ApplicationError::InternalServerError { message, .. } => {
                ErrorMessage(message.to_string())
            }
        }
    }
}

impl Debug for ApplicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}\n", &self)?;
        let mut current = self.source();

        while let Some(cause) = current {
            writeln!(f, "Caused by:\n\t{}", cause)?;
            current = cause.source();
        }

        Ok(())
    }
}

impl From<InternalError> for ApplicationError {
    fn from(error: InternalError) -> Self {
        ApplicationError::InternalServerError {
            message: error.public_message().into(),
            subtype: None,
        }
    }
}

#[derive(ThisError, Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(untagged)]
pub enum OrderdeskError {
    Internal(InternalError),
    Application(ApplicationError),
}

impl AsRef<str> for OrderdeskError {
    fn as_ref(&self) -> &str {
        match self {
            OrderdeskError::Internal(e) => e.as_ref(),
            OrderdeskError::Application(e) => e.as_ref(),
        }
    }
}

impl From<anyhow::Error> for OrderdeskError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<OrderdeskError>() {
            Some(orderdesk_error) => orderdesk_error.clone(),
            None => OrderdeskError::Internal(InternalError::UnknownError {
                message: error.to_string(),
                subtype: None,
            }),
        }
    }
}

impl<'a> From<&'a OrderdeskError> for StatusCode {
    fn from(value: &'a OrderdeskError) -> Self {
        match value {
            OrderdeskError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrderdeskError::Application(e) => match e {
                ApplicationError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                ApplicationError::NotFound { .. } => StatusCode::NOT_FOUND,
                ApplicationError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<OrderdeskError> for StatusCode {
    fn from(value: OrderdeskError) -> Self {
        (&value).into()
    }
}

impl OrderdeskError {
    fn internal(internal: InternalError) -> Self {
        OrderdeskError::Internal(internal)
    }

    fn application(application: ApplicationError) -> Self {
        OrderdeskError::Application(application)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from(self)
    }

    /// The client-facing view of this error: application errors pass through,
    /// internal errors collapse into a sanitized internal server error.
    pub fn as_application(&self) -> ApplicationError {
        match self {
            OrderdeskError::Application(e) => e.clone(),
            OrderdeskError::Internal(e) => e.clone().into(),
        }
    }

    pub fn public_message(&self) -> String {
        self.as_application().message().to_string()
    }

    pub fn as_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.public_message() })
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, OrderdeskError::Internal(_))
    }

    pub fn is_application(&self) -> bool {
        matches!(self, OrderdeskError::Application(_))
    }
}

impl ErrorMeta for OrderdeskError {
    fn code(&self) -> ErrorCode {
        match self {
            OrderdeskError::Internal(e) => e.code(),
            OrderdeskError::Application(e) => e.code(),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            OrderdeskError::Internal(e) => e.key(),
            OrderdeskError::Application(e) => e.key(),
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            OrderdeskError::Internal(e) => e.message(),
            OrderdeskError::Application(e) => e.message(),
        }
    }
}

impl Display for OrderdeskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OrderdeskError::Internal(e) => write!(f, "{}", e),
            OrderdeskError::Application(e) => write!(f, "{}", e),
        }
    }
}
