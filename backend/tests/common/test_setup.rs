use axum::{body::Body, http::Request, response::Response, Router};
use backend::{server, testing::MemoryStorage, types::Environment};
use std::sync::Arc;
use tower::ServiceExt;

/// Setup test environment: tracing for test output
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Router wired to an in-memory bucket
pub struct TestContext {
    pub router: Router,
    pub storage: Arc<MemoryStorage>,
}

impl TestContext {
    pub fn new() -> Self {
        setup_test_env();

        let storage = Arc::new(MemoryStorage::new("http://bucket.test", 360));
        let environment = Environment::Development {
            presign_expiry_override: None,
        };

        let router = server::app(environment, storage.clone());

        Self { router, storage }
    }

    pub async fn send_json_request(
        &self,
        method: &str,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_raw_request(method, route, payload.to_string()).await
    }

    pub async fn send_raw_request(
        &self,
        method: &str,
        route: &str,
        body: String,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method(method)
            .header("Content-Type", "application/json")
            .body(Body::from(body))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_json_request("POST", route, payload).await
    }

    pub async fn send_delete_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_json_request("DELETE", route, payload).await
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}
