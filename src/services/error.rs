//! Error handling utilities for route handlers

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Every failure a request can end in. The `Display` text is what the client sees.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client input rejected by the upload validator
    #[error("{0}")]
    Validation(String),

    #[error("Missing file or filename")]
    MissingField,

    #[error("File too large")]
    FileTooLarge,

    /// The store refused or aborted the write; the underlying message is surfaced
    #[error("{0}")]
    StoreWrite(String),

    /// The object exists but could not be made public. Nothing is rolled back.
    #[error("Upload succeeded but making public failed")]
    MakePublic,

    #[error("{0}")]
    Unexpected(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub const NOT_AN_IMAGE: &'static str = "Only image files are allowed";

    pub fn not_an_image() -> Self {
        ApiError::Validation(Self::NOT_AN_IMAGE.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MissingField | ApiError::FileTooLarge => {
                StatusCode::BAD_REQUEST
            }
            ApiError::StoreWrite(_) | ApiError::MakePublic | ApiError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Extension trait for logging errors and converting to an [`ApiError`]
pub trait LogErr<T> {
    /// Log error with context and map it with `f`
    fn log_as(self, context: &str, f: impl FnOnce(String) -> ApiError) -> Result<T, ApiError>;
}

impl<T, E: std::fmt::Display> LogErr<T> for Result<T, E> {
    fn log_as(self, context: &str, f: impl FnOnce(String) -> ApiError) -> Result<T, ApiError> {
        self.map_err(|e| {
            error!("{}: {}", context, e);
            f(e.to_string())
        })
    }
}
