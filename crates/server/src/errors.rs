use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use common::types::ErrorBody;
use service::cart::{CartError, CartOperation};

/// JSON error response: `{"error": title, "message": detail}`.
#[derive(Debug, Clone)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: String,
    pub message: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &str, message: Option<String>) -> Self {
        Self { status, title: title.to_string(), message }
    }

    /// Map a failed cart operation; the message is the same notice the
    /// store sent to its notifier.
    pub fn from_cart(op: CartOperation, err: &CartError) -> Self {
        let (status, title) = match err {
            CartError::StockExceeded { .. } => (StatusCode::CONFLICT, "Stock Exceeded"),
            CartError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not Found"),
            CartError::Catalog(_) => (StatusCode::BAD_GATEWAY, "Catalog Unavailable"),
            CartError::Storage(_) | CartError::Model(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };
        Self::new(status, title, Some(err.user_message(op).to_string()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.title, message: self.message };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl IntoResponse for StartupError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let msg = self.to_string();
        error!(error = %msg, "startup error");
        (status, Json(ErrorBody { error: "Startup Error".into(), message: Some(msg) })).into_response()
    }
}
