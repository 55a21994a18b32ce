//! HTTP error mapping: every failure is `{"detail": "..."}` with a status

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use neo_core::NeoError;
use serde_json::json;

/// Errors a handler can answer with
#[derive(Debug)]
pub enum ApiError {
    /// 404
    NotFound(String),
    /// 500 with diagnostic text
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound(detail) | Self::Internal(detail) => detail,
        }
    }

    /// 500 carrying `context` and the full error chain
    pub fn internal(context: &str, err: &NeoError) -> Self {
        tracing::error!(
            category = err.category().as_str(),
            error = %error_chain(err),
            "{context}"
        );
        Self::Internal(format!("{context}: {}", error_chain(err)))
    }
}

impl From<NeoError> for ApiError {
    fn from(err: NeoError) -> Self {
        Self::internal("request failed", &err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

/// `outer: inner: root` rendering of an error and its sources
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    rendered
}
