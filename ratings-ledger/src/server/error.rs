//! Mapping of service errors to HTTP responses.
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ratings_ledger_engine::errors::{ActivityError, LedgerError, ServiceError};
use serde_json::json;
use tracing::error;

/// Errors returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or malformed caller identity")]
    Unauthorized,
    #[error("{0}")]
    Unavailable(&'static str),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::Unavailable(_) => (StatusCode::NOT_FOUND, "unavailable"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::Service(error) => match error {
                ServiceError::Ledger(LedgerError::EntityNotFound { .. }) => {
                    (StatusCode::NOT_FOUND, "entity_not_found")
                }
                ServiceError::Activity(ActivityError::ActivityNotFound(_)) => {
                    (StatusCode::NOT_FOUND, "activity_not_found")
                }
                ServiceError::Ledger(LedgerError::SelfVote { .. }) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "self_vote")
                }
                ServiceError::NotCommentAuthor { .. } => {
                    (StatusCode::FORBIDDEN, "not_comment_author")
                }
                ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
                ServiceError::Ledger(LedgerError::Repository(_))
                | ServiceError::Activity(ActivityError::Repository(_))
                | ServiceError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({ "error": { "code": code, "message": message } })),
        )
            .into_response()
    }
}
