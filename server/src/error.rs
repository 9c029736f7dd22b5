use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use logvault_service::ErrorKind;
use logvault_service::LogServiceError;
use serde_json::json;
use tracing::error;

/// Error returned by every handler; rendered as `{"error": "..."}`.
#[derive(Debug)]
pub(crate) struct ApiError(LogServiceError);

impl ApiError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self(LogServiceError::Validation(message.into()))
    }
}

impl From<LogServiceError> for ApiError {
    fn from(err: LogServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Backend details stay in the server log.
            error!("request failed: {}", self.0);
            "internal storage error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
