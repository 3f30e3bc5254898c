use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::accounts::validation::ValidationIssue;

pub const CONFLICT_MESSAGE: &str = "username or email already in use";

/// Failures reported by an [`AccountStore`](crate::accounts::repo::AccountStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("unique constraint violated")]
    Conflict,

    /// The record to update no longer exists.
    #[error("record not found")]
    Missing,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Other(anyhow::Error::new(e)),
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("validation failed")]
    Validation(Vec<ValidationIssue>),

    #[error("{}", CONFLICT_MESSAGE)]
    Conflict,

    #[error("account '{0}' not found")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(#[source] anyhow::Error),
}

pub type AccountResult<T> = Result<T, AccountError>;

impl AccountError {
    pub fn invalid(path: &str, message: &str) -> Self {
        AccountError::Validation(vec![ValidationIssue::new(path, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::Validation(_) | AccountError::Conflict => StatusCode::BAD_REQUEST,
            AccountError::NotFound(_) => StatusCode::NOT_FOUND,
            AccountError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AccountError::Conflict,
            StoreError::Missing => AccountError::Internal(anyhow::anyhow!("record vanished during update")),
            StoreError::Other(e) => AccountError::Internal(e),
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AccountError::Validation(issues) => json!({
                "message": "validation failed",
                "errors": issues,
            }),
            AccountError::Conflict => json!({ "message": CONFLICT_MESSAGE }),
            AccountError::NotFound(_) => json!({ "message": "user not found" }),
            AccountError::Internal(e) => {
                error!(error = ?e, "internal error");
                json!({ "message": "internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
