use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use burrow_core::ShortenerError;
use tracing::{error, info};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        match value {
            ShortenerError::InvalidUrl(message) => AppError::BadRequest(message),
            ShortenerError::NotFound(message) => AppError::NotFound(message),
            ShortenerError::Storage(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => {
                info!(reason = %message, "bad request");
                (StatusCode::BAD_REQUEST, "Bad Request").into_response()
            }
            AppError::NotFound(message) => {
                info!(reason = %message, "not found");
                (StatusCode::NOT_FOUND, "Not Found").into_response()
            }
            AppError::Internal(message) => {
                error!(error = %message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
