use aide::axum::IntoApiResponse;
use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::Serialize;

use crate::types::Environment;

/// Body of `GET /health`
#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthResponse {
    /// Always `ok`
    status: &'static str,
    /// Deployment stage the server runs in
    environment: &'static str,
    /// Crate version
    semver: &'static str,
    /// Commit the binary was built from, when `GIT_REV` was set at build time
    rev: Option<&'static str>,
}

/// Liveness probe; does not touch the bucket
#[allow(clippy::unused_async)]
pub async fn handler(Extension(environment): Extension<Environment>) -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok",
        environment: environment.name(),
        semver: env!("CARGO_PKG_VERSION"),
        rev: option_env!("GIT_REV"),
    })
}
