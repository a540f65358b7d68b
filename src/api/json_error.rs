use axum::{
    extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse,
    response::Response, Json,
};
use validator::ValidationErrors;

/// Errors are shaped as `{"detail": ...}` on the wire; the UI surfaces
/// the detail string verbatim.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("Invalid JSON format")]
    InvalidJson(#[from] JsonRejection),
    #[error("Validation error")]
    ValidationError(ValidationErrors),
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidJson(_) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "detail": "Invalid JSON format" })),
            )
                .into_response(),
            Self::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "detail": errors.to_string() })),
            )
                .into_response(),
        }
    }
}
