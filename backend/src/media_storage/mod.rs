//! S3-based object storage operations
mod error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

pub use error::{BucketError, BucketResult};

/// Presigned URL with expiration information
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL for PUT operations
    pub url: String,
    /// UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Builds a globally unique storage key for an uploaded file
///
/// The key is a random UUID followed by the original file name, so two uploads of the
/// same file never collide.
#[must_use]
pub fn generate_object_key(file_name: &str) -> String {
    format!("{}-{file_name}", Uuid::new_v4())
}

/// Storage backend used by the upload routes
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Lifetime of the presigned URLs issued by this storage, in seconds
    fn presigned_url_expiry_secs(&self) -> u64;

    /// Generates a presigned URL authorizing a single PUT of `key`
    ///
    /// # Errors
    ///
    /// Returns `BucketError::InvalidInput` if the content length cannot be represented
    /// Returns `BucketError::ConfigError` if presigning config creation fails
    /// Returns `BucketError::S3Error` if presigned URL generation fails
    async fn generate_presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
    ) -> BucketResult<PresignedUrl>;

    /// Deletes the object stored under `key`
    ///
    /// Deleting a key that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::UpstreamError` for 5xx errors
    /// Returns `BucketError::S3Error` or `BucketError::AwsError` for any other failure
    async fn delete_object(&self, key: &str) -> BucketResult<()>;
}

/// Object storage client for S3 operations
pub struct MediaStorage {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    presigned_url_expiry_secs: u64,
}

impl MediaStorage {
    /// Creates a new media storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket name for uploaded files
    /// * `presigned_url_expiry_secs` - Expiry time for presigned URLs in seconds
    #[must_use]
    pub const fn new(
        s3_client: Arc<S3Client>,
        bucket_name: String,
        presigned_url_expiry_secs: u64,
    ) -> Self {
        Self {
            s3_client,
            bucket_name,
            presigned_url_expiry_secs,
        }
    }
}

#[async_trait]
impl ObjectStorage for MediaStorage {
    fn presigned_url_expiry_secs(&self) -> u64 {
        self.presigned_url_expiry_secs
    }

    async fn generate_presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
    ) -> BucketResult<PresignedUrl> {
        let content_length = i64::try_from(content_length).map_err(|_| {
            BucketError::InvalidInput(format!("content length out of range: {content_length}"))
        })?;

        let presigned_config =
            PresigningConfig::expires_in(Duration::from_secs(self.presigned_url_expiry_secs))
                .map_err(|e| {
                    BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
                })?;

        let presigned_url = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_length(content_length)
            .content_type(content_type)
            .presigned(presigned_config)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        let expires_at: DateTime<Utc> =
            Utc::now() + Duration::from_secs(self.presigned_url_expiry_secs);

        debug!(key, %expires_at, "Generated presigned PUT URL");

        Ok(PresignedUrl {
            url: presigned_url.uri().to_string(),
            expires_at,
        })
    }

    async fn delete_object(&self, key: &str) -> BucketResult<()> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await?;

        debug!(key, "Deleted object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    fn offline_storage(expiry_secs: u64) -> MediaStorage {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url("http://localhost:4566")
            .force_path_style(true)
            .build();

        MediaStorage::new(
            Arc::new(S3Client::from_conf(config)),
            "uploads".to_string(),
            expiry_secs,
        )
    }

    #[test]
    fn generated_keys_are_unique_and_keep_the_file_name() {
        let first = generate_object_key("a.png");
        let second = generate_object_key("a.png");

        assert_ne!(first, second);
        assert!(first.ends_with("-a.png"));

        let uuid_part = first.trim_end_matches("-a.png");
        assert!(Uuid::parse_str(uuid_part).is_ok());
    }

    #[tokio::test]
    async fn presigned_url_targets_bucket_and_key() {
        let storage = offline_storage(360);

        let presigned = storage
            .generate_presigned_put_url("abc-a.png", "image/png", 1024)
            .await
            .unwrap();

        assert!(presigned
            .url
            .starts_with("http://localhost:4566/uploads/abc-a.png?"));
        assert!(presigned.url.contains("X-Amz-Expires=360"));
        assert!(presigned.url.contains("X-Amz-Signature="));
        assert!(presigned.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn presigned_url_rejects_unrepresentable_length() {
        let storage = offline_storage(360);

        let result = storage
            .generate_presigned_put_url("abc-a.png", "image/png", u64::MAX)
            .await;

        assert!(matches!(result, Err(BucketError::InvalidInput(_))));
    }
}
