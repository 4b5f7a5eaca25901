//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; any [`mediavault_common::Error`]
//! converts with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mediavault_common::Error;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: Error,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.inner.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.kind().code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
