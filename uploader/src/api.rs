use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use common_types::{
    DeleteRequest, DeleteResponse, ErrorResponse, PresignRequest, PresignResponse,
    UploadConfigResponse,
};
use futures::stream;
use reqwest::{
    header::{CONTENT_LENGTH, CONTENT_TYPE},
    Body, Client, Response, StatusCode,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

use crate::entry::LocalFile;
use crate::error::{ApiError, ApiResult};
use crate::transfer::ProgressReporter;

/// Connect timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;
/// Size of the chunks a file body is streamed in
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Calls the uploader makes to the backend and to the storage bucket
#[async_trait]
pub trait UploadApi: Send + Sync {
    /// Requests a presigned PUT URL for the described file
    async fn presign(&self, request: &PresignRequest) -> ApiResult<PresignResponse>;

    /// Streams `file` to a presigned URL, reporting bytes as they are handed to the transport
    ///
    /// Only `200 OK` and `204 No Content` count as success.
    async fn put_object(
        &self,
        url: &str,
        file: &LocalFile,
        progress: ProgressReporter,
    ) -> ApiResult<()>;

    /// Deletes the object stored under `key`
    async fn delete(&self, key: &str) -> ApiResult<DeleteResponse>;
}

/// HTTP client to the upload backend
///
/// For the server side see the `backend` crate in this repository.
#[derive(Clone)]
pub struct HttpUploadApi {
    base_url: String,
    http_client: ClientWithMiddleware,
}

impl HttpUploadApi {
    /// Creates a client for the backend served at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let reqwest_client = Client::builder()
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .build()?;

        let http_client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Backend address without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the upload limits the backend enforces
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status
    pub async fn upload_config(&self) -> ApiResult<UploadConfigResponse> {
        let url = format!("{}/api/s3/config", self.base_url);
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json::<UploadConfigResponse>().await?)
    }
}

/// Builds an [`ApiError::Status`], taking the message from the `{error}` envelope when present
async fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
    };

    ApiError::Status { status, message }
}

#[async_trait]
impl UploadApi for HttpUploadApi {
    async fn presign(&self, request: &PresignRequest) -> ApiResult<PresignResponse> {
        let url = format!("{}/api/s3/upload", self.base_url);
        let response = self.http_client.post(url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json::<PresignResponse>().await?)
    }

    async fn put_object(
        &self,
        url: &str,
        file: &LocalFile,
        mut progress: ProgressReporter,
    ) -> ApiResult<()> {
        let data = file.data().clone();
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| data.slice(start..data.len().min(start + UPLOAD_CHUNK_SIZE)))
            .collect();

        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            progress.advance(chunk.len());
            Ok::<_, std::io::Error>(chunk)
        }));

        let response = self
            .http_client
            .put(url)
            .header(CONTENT_TYPE, file.content_type())
            .header(CONTENT_LENGTH, file.size())
            .body(Body::wrap_stream(body))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(status_error(response).await),
        }
    }

    async fn delete(&self, key: &str) -> ApiResult<DeleteResponse> {
        let url = format!("{}/api/s3/delete", self.base_url);
        let request = DeleteRequest {
            key: key.to_string(),
        };
        let response = self.http_client.delete(url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        Ok(response.json::<DeleteResponse>().await?)
    }
}
