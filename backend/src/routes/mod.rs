mod docs;
mod health;
/// Presign, delete and upload config handlers
pub mod s3;

pub use docs::openapi;

use aide::axum::{
    routing::{delete, get, post},
    ApiRouter,
};

/// Creates the router with all handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route("/api/s3/upload", post(s3::create_presigned_upload_url))
        .api_route("/api/s3/delete", delete(s3::delete_object))
        .api_route("/api/s3/config", get(s3::get_upload_config))
}
