use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::{store::StoreError, upload_service::UploadError};

/// Message returned for every upstream failure; details stay in the logs.
const INTERNAL_MESSAGE: &str = "Internal server error";

/// An HTTP-facing error: a status code plus the message shown to the client.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error. The detail is logged, not returned.
    pub fn internal(detail: impl fmt::Display) -> Self {
        tracing::error!(error = %detail, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request (client input errors).
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(format!("{err:#}"))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(resource) => AppError::not_found(format!("{resource} not found")),
            StoreError::Validation(msg) => AppError::bad_request(msg),
            StoreError::SlugConflict(slug) => {
                tracing::info!(%slug, "rejected duplicate slug");
                AppError::bad_request("Slug already exists")
            }
            StoreError::Sqlx(err) => AppError::internal(err),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::EmptyFile | UploadError::InvalidName(_) => {
                AppError::bad_request(err.to_string())
            }
            UploadError::NotFound(_) => AppError::not_found("File not found"),
            UploadError::Io(err) => AppError::internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_distinct_statuses() {
        let not_found: AppError = StoreError::NotFound("Blog").into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.message, "Blog not found");

        let invalid: AppError =
            StoreError::Validation("Missing required fields: excerpt".into()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert!(invalid.message.contains("excerpt"));

        let conflict: AppError = StoreError::SlugConflict("acme".into()).into();
        assert_eq!(conflict.status, StatusCode::BAD_REQUEST);
        assert_eq!(conflict.message, "Slug already exists");

        let upstream: AppError = StoreError::Sqlx(sqlx::Error::PoolTimedOut).into();
        assert_eq!(upstream.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.message, INTERNAL_MESSAGE);
    }

    #[test]
    fn upload_errors_map_to_client_or_server_errors() {
        let empty: AppError = UploadError::EmptyFile.into();
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);

        let io: AppError = UploadError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(io.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!io.message.contains("disk full"));
    }

    #[test]
    fn unauthorized_has_fixed_message() {
        let err = AppError::unauthorized();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Unauthorized");
    }
}
