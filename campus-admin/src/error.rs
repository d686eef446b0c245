use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use campus_core::errors::CampusError;
use campus_core::ValidationReport;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

/// Error returned by page handlers, rendered as `{ "error": ... }`.
#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    message: String,
    details: Option<serde_json::Value>,
}

impl AppError {
    pub fn bad_request<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 422 carrying the per-field messages of a failed validation.
    pub fn invalid(report: &ValidationReport) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "validation failed".to_string(),
            details: serde_json::to_value(report).ok(),
        }
    }

    fn new<M: Into<String>>(status: StatusCode, message: M) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => serde_json::json!({ "error": self.message, "fields": details }),
            None => serde_json::json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<CampusError> for AppError {
    fn from(err: CampusError) -> Self {
        match err {
            CampusError::NotFound(message) => AppError::not_found(message),
            CampusError::InvalidId(message) | CampusError::ValidationError(message) => {
                AppError::bad_request(message)
            }
            other => {
                error!(error = %other, "request failed");
                AppError::internal("internal server error")
            }
        }
    }
}
