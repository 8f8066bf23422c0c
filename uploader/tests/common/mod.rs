// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

use std::sync::Arc;
use std::time::Duration;

use backend::testing::TestServer;
use common_types::{DeleteResponse, PresignRequest, PresignResponse};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use uploader::api::{HttpUploadApi, UploadApi};
use uploader::drop_surface::DropLimits;
use uploader::entry::LocalFile;
use uploader::error::ApiResult;
use uploader::transfer::ProgressReporter;
use uploader::Uploader;

/// Setup test environment: tracing for test output
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Uploader wired to a backend and bucket running in-process
pub struct TestContext {
    pub server: TestServer,
    pub uploader: Uploader<HttpUploadApi>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_limits(DropLimits::default()).await
    }

    pub async fn with_limits(limits: DropLimits) -> Self {
        setup_test_env();

        let server = TestServer::start()
            .await
            .expect("Failed to start test server");
        let api = HttpUploadApi::new(server.base_url()).expect("Failed to build client");
        let uploader = Uploader::new(Arc::new(api), limits);

        Self { server, uploader }
    }
}

pub fn png(name: &str, size: usize) -> LocalFile {
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    LocalFile::new(name, "image/png", data)
}

/// Asserts `key` has the `{uuid}-{file_name}` shape
pub fn assert_key_for(key: &str, file_name: &str) {
    let (uuid, rest) = key.split_at(36);
    assert!(
        uuid::Uuid::parse_str(uuid).is_ok(),
        "key {key} does not start with a uuid"
    );
    assert_eq!(rest, format!("-{file_name}"));
}

/// Api that presigns through the backend but sends every PUT to `bucket_url`
pub struct RedirectedPuts {
    pub inner: HttpUploadApi,
    pub bucket_url: String,
}

#[async_trait::async_trait]
impl UploadApi for RedirectedPuts {
    async fn presign(&self, request: &PresignRequest) -> ApiResult<PresignResponse> {
        let mut presigned = self.inner.presign(request).await?;
        presigned.presigned_url = format!("{}/{}", self.bucket_url, presigned.key);
        Ok(presigned)
    }

    async fn put_object(
        &self,
        url: &str,
        file: &LocalFile,
        progress: ProgressReporter,
    ) -> ApiResult<()> {
        self.inner.put_object(url, file, progress).await
    }

    async fn delete(&self, key: &str) -> ApiResult<DeleteResponse> {
        self.inner.delete(key).await
    }
}

/// Bucket that answers `403` as soon as the request head arrives, then drains the body slowly
///
/// Returns the bucket URL and a receiver resolving once the body was read to the end.
pub async fn spawn_early_rejecting_bucket() -> (String, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (drained_tx, drained_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 64 * 1024];
        let mut head = Vec::new();

        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            head.extend_from_slice(&buf[..n]);
        }

        socket
            .write_all(b"HTTP/1.1 403 Forbidden\r\ncontent-length: 0\r\n\r\n")
            .await
            .unwrap();

        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        }
        let _ = drained_tx.send(());
    });

    (format!("http://{addr}/bucket"), drained_rx)
}
