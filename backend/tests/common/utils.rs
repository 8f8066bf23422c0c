use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::json;

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub fn create_presign_request(file_name: &str, content_type: &str, size: u64) -> serde_json::Value {
    json!({
        "fileName": file_name,
        "contentType": content_type,
        "size": size
    })
}

pub fn create_delete_request(key: &str) -> serde_json::Value {
    json!({ "key": key })
}
