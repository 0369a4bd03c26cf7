//! JSON error envelope shared by every route.

use crate::Error;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// `{ "error": ..., "details"?: ... }` with the status derived from the
/// error kind.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Client errors carry their own message. Server errors are summarized by
    /// `context`, with the underlying error attached only in development.
    pub fn from_error(context: &str, err: Error, development: bool) -> Self {
        let status = err.kind().status();
        if status.is_client_error() {
            tracing::warn!("{}: {}", context, err);
            return Self::new(status, err.to_string());
        }

        tracing::error!("{}: {}", context, err);
        let api_error = Self::new(status, context);
        if development {
            api_error.with_details(json!(err.to_string()))
        } else {
            api_error
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            format!("Invalid JSON body: {}", rejection.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
