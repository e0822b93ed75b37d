//! HTTP error envelope
//!
//! Every failure leaves the server as `{ "error": <summary>, "message":
//! <detail> }`. Upstream failures keep the upstream status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use goldfish_domain::GoldfishError;
use serde::Serialize;

use crate::utils::logging::error_label;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { status, error: error.into(), message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(StatusCode::BAD_REQUEST, message.clone(), message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(StatusCode::UNAUTHORIZED, message.clone(), message)
    }

    /// Replace the summary, keeping status and detail.
    #[must_use]
    pub fn summary(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<GoldfishError> for ApiError {
    fn from(err: GoldfishError) -> Self {
        let status = match &err {
            GoldfishError::Auth(_) => StatusCode::UNAUTHORIZED,
            GoldfishError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            GoldfishError::NotFound(_) => StatusCode::NOT_FOUND,
            GoldfishError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &err {
            GoldfishError::Upstream { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self::new(status, error_label(&err), message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.error, message = %self.message, "request failed");
        }
        (self.status, Json(ErrorBody { error: self.error, message: self.message })).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
