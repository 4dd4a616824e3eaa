//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router for both relay surfaces
//! - Wire up middleware (tracing, request ID, timeouts, body limits)
//! - Dispatch requests to the mirror and staging handlers
//! - Serve with graceful shutdown (signals or staging shutdown request)

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::schema::{RelayConfig, StagingConfig};
use crate::http::request::RequestIdLayer;
use crate::lifecycle::{signals, Shutdown};
use crate::mirror::client::{UpstreamClient, UpstreamError};
use crate::mirror::handler as mirror;
use crate::net::tls::TrustAnchor;
use crate::staging;
use crate::store::FileStore;

/// Application state injected into handlers.
///
/// Everything here is read-only after startup; requests share nothing
/// mutable.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub store: Arc<FileStore>,
    pub staging: Arc<StagingConfig>,
    pub shutdown: Shutdown,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
    shutdown: Shutdown,
}

impl RelayServer {
    /// Create a new server from a validated configuration and the trust
    /// anchor loaded at startup.
    pub fn new(config: RelayConfig, anchor: Option<TrustAnchor>) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(&config.upstream, &config.timeouts, anchor)?;
        let store = FileStore::new(config.staging.directory.clone());
        let shutdown = Shutdown::new();

        let state = AppState {
            upstream: Arc::new(upstream),
            store: Arc::new(store),
            staging: Arc::new(config.staging.clone()),
            shutdown: shutdown.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            shutdown,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let body_limit = usize::try_from(config.staging.max_file_bytes).unwrap_or(usize::MAX);

        let mirror_routes = Router::new()
            .route("/api/v1/endpoints", get(mirror::endpoints))
            .route("/health", get(health))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )));

        let staging_routes = Router::new()
            .route(
                "/{secret}",
                get(staging::status).delete(staging::shutdown),
            )
            .route(
                "/{secret}/{file_id}",
                put(staging::stage)
                    .get(staging::download)
                    .delete(staging::remove),
            )
            .layer(DefaultBodyLimit::max(body_limit));

        Router::new()
            .merge(mirror_routes)
            .merge(staging_routes)
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until a
    /// shutdown signal or a staging shutdown request arrives.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let mut shutdown_rx = self.shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = signals::shutdown_signal() => {}
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Shutdown requested via staging API");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Handle that triggers this server's graceful shutdown.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Liveness probe.
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
