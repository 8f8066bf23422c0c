//! Wire types shared by the upload backend and the uploader client

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Maximum number of files accepted in a single batch
pub const MAX_FILES: usize = 5;

/// Maximum size of a single file, in megabytes
pub const MAX_FILE_SIZE_MB: u64 = 10;

/// Storage keys are capped at 1024 bytes; a generated key is `{uuid}-{file_name}`
pub const MAX_FILE_NAME_LEN: usize = 1024 - 37;

/// Converts a size in megabytes to bytes
#[must_use]
pub const fn megabytes(mb: u64) -> u64 {
    mb * 1024 * 1024
}

/// Checks the UTF-8 length of a file name, which is what counts against the key limit
///
/// # Errors
///
/// Returns an error if the name exceeds [`MAX_FILE_NAME_LEN`] bytes
pub fn validate_file_name_len(file_name: &str) -> Result<(), ValidationError> {
    if file_name.len() > MAX_FILE_NAME_LEN {
        return Err(ValidationError::new("file_name_too_long"));
    }
    Ok(())
}

/// Body of `POST /api/s3/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    /// Original name of the file, used as the suffix of the storage key
    #[validate(custom(function = "validate_file_name_len"))]
    pub file_name: String,
    /// Declared content type, bound into the presigned request
    pub content_type: String,
    /// Size in bytes, bound into the presigned request
    pub size: u64,
}

/// Successful response of `POST /api/s3/upload`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignResponse {
    /// URL authorizing a single PUT of the object
    pub presigned_url: String,
    /// Storage key the object will be written under
    pub key: String,
}

/// Body of `DELETE /api/s3/delete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, JsonSchema)]
pub struct DeleteRequest {
    /// Storage key of the object to delete
    #[validate(length(min = 1))]
    pub key: String,
}

/// Successful response of `DELETE /api/s3/delete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeleteResponse {
    /// Confirmation message
    pub message: String,
}

/// Error envelope returned by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

/// Response of `GET /api/s3/config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfigResponse {
    /// Maximum count of files per batch
    pub max_files: usize,
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,
    /// Lifetime of an issued presigned URL
    pub presign_expiry_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presign_request_uses_camel_case() {
        let request: PresignRequest = serde_json::from_value(json!({
            "fileName": "a.png",
            "contentType": "image/png",
            "size": 1024
        }))
        .unwrap();

        assert_eq!(request.file_name, "a.png");
        assert_eq!(request.content_type, "image/png");
        assert_eq!(request.size, 1024);
    }

    #[test]
    fn presign_request_rejects_missing_content_type() {
        let result = serde_json::from_value::<PresignRequest>(json!({
            "fileName": "a.png",
            "size": 1024
        }));
        assert!(result.is_err());
    }

    #[test]
    fn presign_request_rejects_negative_size() {
        let result = serde_json::from_value::<PresignRequest>(json!({
            "fileName": "a.png",
            "contentType": "image/png",
            "size": -1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn presign_request_rejects_overlong_file_name() {
        let request = PresignRequest {
            file_name: "a".repeat(1000),
            content_type: "image/png".to_string(),
            size: 1,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn presign_request_counts_file_name_bytes() {
        let request = PresignRequest {
            file_name: "é".repeat(980),
            content_type: "image/png".to_string(),
            size: 1,
        };
        assert!(request.validate().is_err());

        let request = PresignRequest {
            file_name: "é".repeat(MAX_FILE_NAME_LEN / 2),
            content_type: "image/png".to_string(),
            size: 1,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn delete_request_rejects_empty_key() {
        let request = DeleteRequest { key: String::new() };
        assert!(request.validate().is_err());

        let request = DeleteRequest {
            key: "abc-a.png".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn presign_response_serializes_camel_case() {
        let response = PresignResponse {
            presigned_url: "http://localhost/x".to_string(),
            key: "k".to_string(),
        };
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["presignedUrl"], "http://localhost/x");
        assert_eq!(value["key"], "k");
    }

    #[test]
    fn megabytes_converts_to_bytes() {
        assert_eq!(megabytes(MAX_FILE_SIZE_MB), 10_485_760);
    }
}
