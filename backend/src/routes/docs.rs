use aide::{
    axum::ApiRouter,
    openapi::{Info, OpenApi},
    scalar::Scalar,
};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Extension, Json};

use crate::types::Environment;

const DOCS_TITLE: &str = "Upload Backend Docs";

/// Base document the routes are collected into
#[must_use]
pub fn openapi() -> OpenApi {
    OpenApi {
        info: Info {
            title: "Upload Backend".to_string(),
            description: Some(
                "Presigned S3 uploads and deletion of uploaded objects".to_string(),
            ),
            version: env!("CARGO_PKG_VERSION").to_string(),
            ..Info::default()
        },
        ..OpenApi::default()
    }
}

/// Scalar UI at `/docs` backed by `/openapi.json`, which 404s in production
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .route("/docs", Scalar::new("/openapi.json").with_title(DOCS_TITLE).axum_route())
        .route("/openapi.json", get(openapi_document))
}

#[allow(clippy::unused_async)]
async fn openapi_document(
    Extension(environment): Extension<Environment>,
    Extension(openapi): Extension<OpenApi>,
) -> impl IntoResponse {
    if !environment.show_api_docs() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(openapi).into_response()
}
