use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, TransactionError};
use serde_json::json;
use tracing::field::display;

use crate::alarms::types::AlertStatus;

/// Errors surfaced by the alarm core and mapped onto HTTP responses by the api layer.
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    /// Bad input shape or values.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// Illegal lifecycle transition. State is left untouched.
    #[error("alert {id} cannot be {action} while {status}")]
    InvalidState {
        id: i32,
        action: &'static str,
        status: AlertStatus,
    },

    /// The rule cannot be evaluated for its operator.
    #[error("rule {rule_id} is misconfigured: {reason}")]
    Configuration { rule_id: i32, reason: String },

    #[error("authentication required")]
    Unauthorized,

    /// Authenticated, but the role lacks the capability.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AlarmError>;

impl AlarmError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidState { .. } => StatusCode::CONFLICT,
            Self::Configuration { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TransactionError<AlarmError>> for AlarmError {
    fn from(err: TransactionError<AlarmError>) -> Self {
        match err {
            TransactionError::Connection(e) => Self::Database(e),
            TransactionError::Transaction(e) => e,
        }
    }
}

impl IntoResponse for AlarmError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::Span::current().record("error", display(&self));

        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
            // Database details stay in the logs.
            return (status, Json(json!({"error": "Internal server error"}))).into_response();
        }

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}
