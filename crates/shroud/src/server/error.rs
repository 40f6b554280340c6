use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

// ==============================================================================
// Error Type
// ==============================================================================

/// Request-level failures. Lookup failures for a single field are reported
/// inside a successful response instead (see `resolve::FieldError`).
pub(crate) enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
