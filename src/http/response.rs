//! Error-to-response mapping for the mirror surface.
//!
//! Upstream failures become explicit statuses instead of leaving the caller
//! waiting: 502 for upstream or transport failures, 504 when the bounded
//! upstream timeout fires. Full error details go to the log; the response
//! body carries only the classification.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::mirror::client::UpstreamError;

/// Axum error response wrapper for [`UpstreamError`].
#[derive(Debug)]
pub struct ApiError(pub UpstreamError);

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Status the wrapped error maps to.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Status(_)
            | UpstreamError::Transport(_)
            | UpstreamError::BaseUrl { .. }
            | UpstreamError::Build(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let payload = json!({
            "error": self.0.to_string(),
        });
        (status, Json(payload)).into_response()
    }
}
