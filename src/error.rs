use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::authorization::AuthorizationDenied;

/// ApiError
///
/// Failures a handler can surface. Authorization denials are never swallowed:
/// they become a 403 carrying the denial message and reason.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Forbidden(#[from] AuthorizationDenied),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound => "NOT_FOUND",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        });

        match &self {
            ApiError::Forbidden(denied) => {
                tracing::warn!(
                    action = %denied.action,
                    subject = %denied.subject_kind,
                    field = ?denied.field,
                    reason = ?denied.reason,
                    "authorization denied"
                );
                if let Some(reason) = &denied.reason {
                    body["reason"] = serde_json::Value::from(reason.as_str());
                }
            }
            ApiError::Internal(detail) => {
                tracing::error!("internal error: {}", detail);
                // Do not leak internals to the client.
                body["message"] = serde_json::Value::from("An internal error occurred");
            }
            _ => {}
        }

        (self.status(), Json(body)).into_response()
    }
}
