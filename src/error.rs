use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Error record not found: {0}")]
    ErrorNotFound(String),

    #[error("Invalid request: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::ErrorNotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            AppError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Storage Error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error"),
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
