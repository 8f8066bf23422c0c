use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::put,
    Router,
};
use chrono::Utc;
use tokio::net::TcpListener;

use crate::media_storage::{BucketError, BucketResult, ObjectStorage, PresignedUrl};
use crate::{server, types::Environment};

/// Object written through a presigned PUT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Content type sent with the PUT
    pub content_type: String,
    /// Body of the PUT
    pub data: Bytes,
}

#[derive(Debug, Clone)]
struct PendingPut {
    content_type: String,
    content_length: u64,
}

#[derive(Debug, Default)]
struct Inner {
    pending: HashMap<String, PendingPut>,
    objects: HashMap<String, StoredObject>,
    deleted: Vec<String>,
}

/// In-memory stand-in for the S3 bucket
///
/// Presigned URLs point at `{base_url}/bucket/{key}`; [`MemoryStorage::bucket_router`]
/// serves those URLs and enforces the content type and length bound at presign time.
#[derive(Debug)]
pub struct MemoryStorage {
    base_url: String,
    expiry_secs: u64,
    inner: Mutex<Inner>,
    fail_presign: AtomicBool,
    fail_delete: AtomicBool,
    put_status: AtomicU16,
}

impl MemoryStorage {
    /// Empty bucket whose presigned URLs point at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>, expiry_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            expiry_secs,
            inner: Mutex::default(),
            fail_presign: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            put_status: AtomicU16::new(StatusCode::OK.as_u16()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Makes every presign call fail with an S3 error
    pub fn fail_presign(&self, fail: bool) {
        self.fail_presign.store(fail, Ordering::SeqCst);
    }

    /// Makes every delete call fail with an upstream error
    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Status the bucket answers presigned PUTs with
    pub fn respond_to_puts_with(&self, status: StatusCode) {
        self.put_status.store(status.as_u16(), Ordering::SeqCst);
    }

    /// Object stored under `key`, if any
    #[must_use]
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.lock().objects.get(key).cloned()
    }

    /// Number of objects currently stored
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// Whether a presigned URL was issued for `key`
    #[must_use]
    pub fn was_presigned(&self, key: &str) -> bool {
        self.lock().pending.contains_key(key)
    }

    /// Keys passed to `delete_object`, in call order
    #[must_use]
    pub fn deleted_keys(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    /// Router accepting the presigned PUTs issued by this storage
    pub fn bucket_router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/bucket/{*key}", put(put_object))
            .layer(DefaultBodyLimit::disable())
            .with_state(Arc::clone(self))
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    fn presigned_url_expiry_secs(&self) -> u64 {
        self.expiry_secs
    }

    async fn generate_presigned_put_url(
        &self,
        key: &str,
        content_type: &str,
        content_length: u64,
    ) -> BucketResult<PresignedUrl> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(BucketError::S3Error("presign disabled".to_string()));
        }

        self.lock().pending.insert(
            key.to_string(),
            PendingPut {
                content_type: content_type.to_string(),
                content_length,
            },
        );

        let expiry = i64::try_from(self.expiry_secs).unwrap_or(i64::MAX);
        Ok(PresignedUrl {
            url: format!("{}/bucket/{key}", self.base_url),
            expires_at: Utc::now() + chrono::Duration::seconds(expiry),
        })
    }

    async fn delete_object(&self, key: &str) -> BucketResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BucketError::UpstreamError("delete disabled".to_string()));
        }

        let mut inner = self.lock();
        inner.objects.remove(key);
        inner.deleted.push(key.to_string());
        Ok(())
    }
}

async fn put_object(
    State(storage): State<Arc<MemoryStorage>>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let status = StatusCode::from_u16(storage.put_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if !status.is_success() {
        return status;
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let mut inner = storage.lock();
    let Some(pending) = inner.pending.get(&key) else {
        return StatusCode::FORBIDDEN;
    };

    // A presigned URL is only valid for the signed content type and length
    if pending.content_type != content_type || pending.content_length != body.len() as u64 {
        return StatusCode::FORBIDDEN;
    }

    inner.objects.insert(
        key,
        StoredObject {
            content_type,
            data: body,
        },
    );
    status
}

/// Backend plus bucket served on an ephemeral local port
pub struct TestServer {
    /// Address the server listens on
    pub addr: SocketAddr,
    /// Bucket behind the server
    pub storage: Arc<MemoryStorage>,
}

impl TestServer {
    /// Binds `127.0.0.1:0` and serves the backend routes and the bucket router
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let storage = Arc::new(MemoryStorage::new(format!("http://{addr}"), 360));
        let environment = Environment::Development {
            presign_expiry_override: None,
        };

        let router = server::app(environment, storage.clone()).merge(storage.bucket_router());

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router.into_make_service()).await {
                tracing::error!("Test server stopped: {e}");
            }
        });

        Ok(Self { addr, storage })
    }

    /// Base URL of the running server
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}
