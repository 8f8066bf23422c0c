//! Custom extractors for request validation

use aide::operation::OperationInput;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use common_types::{DeleteRequest, PresignRequest};
use schemars::JsonSchema;
use validator::Validate;

use crate::types::error::AppError;

/// Message a request body reports when it fails to parse or validate
pub trait InvalidBodyMessage {
    /// Message sent to the caller with the 400 response
    const INVALID_BODY_MESSAGE: &'static str;
}

impl InvalidBodyMessage for PresignRequest {
    const INVALID_BODY_MESSAGE: &'static str = "Invalid request body";
}

impl InvalidBodyMessage for DeleteRequest {
    const INVALID_BODY_MESSAGE: &'static str = "Missing or invalid object key.";
}

/// Custom JSON extractor that validates the payload
///
/// Malformed JSON, a missing content type, a schema mismatch and a failed validation rule
/// all become a 400 carrying the body's [`InvalidBodyMessage`].
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned + Validate + InvalidBodyMessage,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| {
                tracing::debug!("Rejected request body: {err}");
                AppError::bad_request(T::INVALID_BODY_MESSAGE)
            })?;

        payload.validate().map_err(|errors| {
            tracing::debug!("Request body failed validation: {errors}");
            AppError::bad_request(T::INVALID_BODY_MESSAGE)
        })?;

        Ok(Self(payload))
    }
}

impl<T> OperationInput for ValidatedJson<T>
where
    T: JsonSchema,
{
    fn operation_input(ctx: &mut aide::generate::GenContext, operation: &mut aide::openapi::Operation) {
        // Same wire shape as Json<T>
        Json::<T>::operation_input(ctx, operation);
    }
}
