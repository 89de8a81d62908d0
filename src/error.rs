use actix_web::{HttpResponse, ResponseError};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Renders any `ResponseError` as `{"error": "<message>"}`.
pub fn json_error<E: ResponseError>(error: &E) -> HttpResponse {
    HttpResponse::build(error.status_code()).json(serde_json::json!({
        "error": error.to_string(),
    }))
}
