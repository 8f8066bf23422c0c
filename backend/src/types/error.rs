//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common_types::ErrorResponse;

use crate::media_storage::BucketError;

/// Message returned for any failure the caller cannot act on
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            inner: ErrorResponse {
                error: message.to_string(),
            },
        }
    }

    /// Create a 400 error with the given message
    #[must_use]
    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Replaces the message while keeping the status
    #[must_use]
    pub fn with_message(self, message: &str) -> Self {
        Self::new(self.status, message)
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Message sent to the caller
    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.error
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {}", self.inner.error),
            500..=599 => tracing::error!("Server error: {}", self.inner.error),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert bucket errors to application errors
///
/// Storage failures never leak their detail to the caller.
impl From<BucketError> for AppError {
    fn from(err: BucketError) -> Self {
        match &err {
            BucketError::UpstreamError(msg) => tracing::error!("S3 upstream error: {msg}"),
            BucketError::S3Error(msg) | BucketError::AwsError(msg) => {
                tracing::error!("S3/AWS error: {msg}");
            }
            BucketError::ConfigError(msg) => tracing::error!("Configuration error: {msg}"),
            BucketError::InvalidInput(msg) => tracing::warn!("Invalid input: {msg}"),
        }

        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }
}

impl OperationOutput for AppError {
    type Inner = ErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ErrorResponse>::operation_response(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn renders_error_envelope() {
        let response = AppError::bad_request("Invalid request body").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Invalid request body" }));
    }

    #[test]
    fn bucket_errors_hide_their_detail() {
        let err = AppError::from(BucketError::S3Error("AccessDenied: secret".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), INTERNAL_ERROR_MESSAGE);

        let err = err.with_message("Failed to delete file.");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to delete file.");
    }
}
