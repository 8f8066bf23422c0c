use std::sync::Arc;

use axum::{Extension, Json};
use common_types::{
    DeleteRequest, DeleteResponse, PresignRequest, PresignResponse, UploadConfigResponse,
    MAX_FILES, MAX_FILE_SIZE_MB,
};
use tracing::instrument;

use crate::{
    media_storage::{generate_object_key, ObjectStorage},
    types::{AppError, ValidatedJson},
};

/// Message returned when the storage delete fails
const DELETE_FAILED_MESSAGE: &str = "Failed to delete file.";

/// Creates a presigned URL for uploading a file directly to S3
///
/// 1. Derives a unique storage key from a random UUID and the file name
/// 2. Generates a presigned PUT URL bound to the declared content type and length
///
/// The returned `key` is what the client later passes to the delete endpoint.
///
/// # Errors
///
/// - 400 when the body is not `{fileName, contentType, size}`
/// - 500 when presigning fails
#[instrument(skip(storage, payload), fields(file_name = %payload.file_name, size = payload.size))]
pub async fn create_presigned_upload_url(
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    ValidatedJson(payload): ValidatedJson<PresignRequest>,
) -> Result<Json<PresignResponse>, AppError> {
    let key = generate_object_key(&payload.file_name);

    let presigned_url = storage
        .generate_presigned_put_url(&key, &payload.content_type, payload.size)
        .await?;

    tracing::info!(%key, expires_at = %presigned_url.expires_at, "Issued presigned upload URL");

    Ok(Json(PresignResponse {
        presigned_url: presigned_url.url,
        key,
    }))
}

/// Deletes a previously uploaded object
///
/// Deleting a key that does not exist is reported as success.
///
/// # Errors
///
/// - 400 when `key` is missing, empty or not a string
/// - 500 when the storage delete fails
#[instrument(skip(storage, payload), fields(key = %payload.key))]
pub async fn delete_object(
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    ValidatedJson(payload): ValidatedJson<DeleteRequest>,
) -> Result<Json<DeleteResponse>, AppError> {
    storage
        .delete_object(&payload.key)
        .await
        .map_err(|e| AppError::from(e).with_message(DELETE_FAILED_MESSAGE))?;

    tracing::info!("Deleted object");

    Ok(Json(DeleteResponse {
        message: "File deleted successfully".to_string(),
    }))
}

/// Upload limits clients enforce before asking for presigned URLs
pub async fn get_upload_config(
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
) -> Json<UploadConfigResponse> {
    Json(UploadConfigResponse {
        max_files: MAX_FILES,
        max_file_size_mb: MAX_FILE_SIZE_MB,
        presign_expiry_secs: storage.presigned_url_expiry_secs(),
    })
}
