// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::models::exam::ExamStatus;

/// Errors raised by the question bank accessor, the exam assembler and the
/// exam lifecycle manager.
#[derive(Debug, thiserror::Error)]
pub enum ExamError {
    /// The question store could not be read.
    #[error("question repository error: {0}")]
    Repository(String),

    /// The exam configuration is out of bounds.
    #[error("invalid exam configuration: {0}")]
    InvalidConfig(String),

    /// The filter matched no question at all.
    #[error("no questions match the selected filters")]
    NoCandidates,

    /// A write to a store failed.
    #[error("store write failed: {0}")]
    Persistence(String),

    #[error("illegal status transition from {from} to {to}")]
    IllegalTransition { from: ExamStatus, to: ExamStatus },

    #[error("exam {0} not found")]
    NotFound(i64),
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., illegal status transition)
    Conflict(String),

    // 422 Unprocessable Entity (e.g., filters matched nothing)
    Unprocessable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ExamError> for AppError {
    fn from(err: ExamError) -> Self {
        match err {
            ExamError::Repository(_) | ExamError::Persistence(_) => {
                AppError::InternalServerError(err.to_string())
            }
            ExamError::InvalidConfig(msg) => AppError::BadRequest(msg),
            ExamError::NoCandidates => AppError::Unprocessable(
                "No questions match the selected filters. Try widening them.".to_string(),
            ),
            ExamError::IllegalTransition { .. } => AppError::Conflict(err.to_string()),
            ExamError::NotFound(_) => AppError::NotFound("Exam not found".to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ExamError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn exam_errors_map_to_http_status() {
        assert_eq!(status_of(ExamError::NoCandidates), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_of(ExamError::NotFound(7)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ExamError::InvalidConfig("question_count".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ExamError::IllegalTransition {
                from: ExamStatus::Completed,
                to: ExamStatus::Pending,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ExamError::Persistence("disk full".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ExamError::Repository("timeout".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn write_failure_message_is_store_neutral() {
        let err = ExamError::Persistence("role update rejected".to_string());
        assert_eq!(err.to_string(), "store write failed: role update rejected");
    }

    #[test]
    fn illegal_transition_message_names_both_states() {
        let err = ExamError::IllegalTransition {
            from: ExamStatus::Completed,
            to: ExamStatus::Pending,
        };
        assert_eq!(err.to_string(), "illegal status transition from completed to pending");
    }
}
