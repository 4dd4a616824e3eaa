//! Mirror request handler.

use std::time::Instant;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};

use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// `GET /api/v1/endpoints`
///
/// Relays the upstream's endpoint-discovery document. On success the
/// upstream body is written through unchanged; failures are classified into
/// 502 (upstream/transport failure) or 504 (upstream timeout) instead of
/// leaving the caller waiting.
pub async fn endpoints(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let request_id = headers.request_id().to_string();

    tracing::info!(
        request_id = %request_id,
        upstream = %state.upstream.base(),
        "mirroring endpoint discovery request"
    );

    let response = match state.upstream.fetch_endpoints().await {
        Ok(body) => {
            tracing::debug!(
                request_id = %request_id,
                bytes = body.len(),
                "endpoint discovery document relayed"
            );
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                error = %err,
                "endpoint discovery fetch failed"
            );
            ApiError(err).into_response()
        }
    };

    metrics::record_request("GET", response.status().as_u16(), "endpoints", start);
    response
}
