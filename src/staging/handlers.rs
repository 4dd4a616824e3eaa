//! Staging request handlers.

use std::io;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::TryStreamExt;
use serde::Serialize;
use tokio_util::io::ReaderStream;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::store::{DiskUtilization, FileId, StagedFile, StoreError};

/// Relay status payload.
#[derive(Debug, Serialize)]
struct StatusReport {
    disk: Option<DiskUtilization>,
    files: Vec<StagedFile>,
}

/// Check the deployment secret carried in the request path.
///
/// Browsers probing for a favicon get a quiet 404 instead of the forbidden
/// noise; everything else with a wrong secret is logged and rejected.
fn authorize(state: &AppState, secret: &str) -> Result<(), Response> {
    if secret == state.staging.secret {
        return Ok(());
    }
    if secret == "favicon.ico" {
        return Err(StatusCode::NOT_FOUND.into_response());
    }
    tracing::warn!(got = %secret, "secret validation failed");
    Err((StatusCode::FORBIDDEN, "Forbidden").into_response())
}

/// `GET /{secret}` — report disk utilization and the staged-file inventory.
pub async fn status(State(state): State<AppState>, Path(secret): Path<String>) -> Response {
    let start = Instant::now();
    if let Err(response) = authorize(&state, &secret) {
        return response;
    }

    tracing::info!("request to report status");

    let response = match state.store.inventory().await {
        Ok(files) => {
            let report = StatusReport {
                disk: state.store.disk_utilization(),
                files,
            };
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to read staged-file inventory");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    };

    metrics::record_request("GET", response.status().as_u16(), "staging-status", start);
    response
}

/// `DELETE /{secret}` — shut the relay down.
///
/// The response is written first; the shutdown broadcast then drains the
/// server gracefully.
pub async fn shutdown(State(state): State<AppState>, Path(secret): Path<String>) -> Response {
    let start = Instant::now();
    if let Err(response) = authorize(&state, &secret) {
        return response;
    }

    tracing::info!("request to shut down");
    state.shutdown.trigger();

    let response = (StatusCode::OK, "Good bye!").into_response();
    metrics::record_request("DELETE", response.status().as_u16(), "staging-shutdown", start);
    response
}

/// `PUT /{secret}/{file_id}` — stage an uploaded file.
///
/// `file_id` must be the SHA-256 digest of the body; the digest is computed
/// while the body streams to disk and compared before the file counts as
/// staged.
pub async fn stage(
    State(state): State<AppState>,
    Path((secret, file_id)): Path<(String, String)>,
    request: Request,
) -> Response {
    let start = Instant::now();
    if let Err(response) = authorize(&state, &secret) {
        return response;
    }

    let response = stage_inner(&state, &file_id, request).await;
    metrics::record_request("PUT", response.status().as_u16(), "staging-file", start);
    response
}

async fn stage_inner(state: &AppState, file_id: &str, request: Request) -> Response {
    let Ok(id) = FileId::parse(file_id) else {
        return (
            StatusCode::BAD_REQUEST,
            "file id must be the lowercase hex SHA-256 digest of the content",
        )
            .into_response();
    };

    let declared_len = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let Some(declared_len) = declared_len else {
        return (StatusCode::BAD_REQUEST, "Content-Length header is required").into_response();
    };
    if declared_len == 0 || declared_len > state.staging.max_file_bytes {
        return (
            StatusCode::BAD_REQUEST,
            format!(
                "Content-Length ({declared_len}) must be greater than zero and not more than {}",
                state.staging.max_file_bytes
            ),
        )
            .into_response();
    }

    tracing::info!(
        file_id = %id,
        bytes = declared_len,
        disk = ?state.store.disk_utilization().map(|d| d.used_percent),
        "request to stage file"
    );

    let body = request.into_body().into_data_stream().map_err(io::Error::other);
    match state.store.stage(&id, declared_len, body).await {
        Ok(()) => {
            tracing::info!(file_id = %id, "file staged successfully");
            (StatusCode::CREATED, "Success").into_response()
        }
        Err(err) => {
            tracing::info!(file_id = %id, error = %err, "file staging failed");
            match err {
                StoreError::AlreadyExists(_) => (StatusCode::CONFLICT, err.to_string()),
                StoreError::OutOfSpace => (
                    StatusCode::INSUFFICIENT_STORAGE,
                    format!("Out of space on {}", state.store.root().display()),
                ),
                StoreError::SizeMismatch { .. } | StoreError::DigestMismatch { .. } => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                StoreError::PermissionDenied(_) => (StatusCode::FORBIDDEN, err.to_string()),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Unexpected error encountered during file upload: {err}"),
                ),
            }
            .into_response()
        }
    }
}

/// `GET /{secret}/{file_id}` — send a staged file to the requester.
pub async fn download(
    State(state): State<AppState>,
    Path((secret, file_id)): Path<(String, String)>,
) -> Response {
    let start = Instant::now();
    if let Err(response) = authorize(&state, &secret) {
        return response;
    }

    tracing::info!(file_id = %file_id, "request to send file");

    let response = match FileId::parse(&file_id) {
        Err(_) => StatusCode::NOT_FOUND.into_response(),
        Ok(id) => match state.store.open(&id).await {
            Ok((file, len)) => (
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (header::CONTENT_LENGTH, len.to_string()),
                ],
                Body::from_stream(ReaderStream::new(file)),
            )
                .into_response(),
            Err(StoreError::NotFound(_)) => StatusCode::NOT_FOUND.into_response(),
            Err(err) => {
                tracing::error!(file_id = %id, error = %err, "failed to open staged file");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        },
    };

    metrics::record_request("GET", response.status().as_u16(), "staging-file", start);
    response
}

/// `DELETE /{secret}/{file_id}` — remove a staged file.
pub async fn remove(
    State(state): State<AppState>,
    Path((secret, file_id)): Path<(String, String)>,
) -> Response {
    let start = Instant::now();
    if let Err(response) = authorize(&state, &secret) {
        return response;
    }

    tracing::info!(file_id = %file_id, "request to delete file");

    let response = match FileId::parse(&file_id) {
        Err(_) => StatusCode::NOT_FOUND.into_response(),
        Ok(id) => match state.store.remove(&id).await {
            Ok(()) => (StatusCode::OK, "Success").into_response(),
            Err(err @ StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, err.to_string()).into_response()
            }
            Err(err @ StoreError::PermissionDenied(_)) => {
                (StatusCode::FORBIDDEN, err.to_string()).into_response()
            }
            Err(err) => {
                tracing::error!(file_id = %id, error = %err, "failed to delete staged file");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        },
    };

    metrics::record_request("DELETE", response.status().as_u16(), "staging-file", start);
    response
}
