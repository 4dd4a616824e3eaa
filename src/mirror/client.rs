//! Outbound client for the upstream perf server.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, StatusCode};
use url::Url;

use crate::config::schema::{TimeoutConfig, UpstreamConfig};
use crate::net::tls::TrustAnchor;

/// Failure modes of one upstream fetch.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("invalid upstream base URL {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build upstream client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream returned HTTP {0}")]
    Status(StatusCode),

    #[error("upstream transport failure: {0}")]
    Transport(#[source] reqwest::Error),
}

/// HTTPS client pinned to the configured trust anchor.
///
/// Built once at startup and shared by every request handler; reqwest
/// multiplexes concurrent fetches over its own pool, so one inbound request
/// never blocks another.
#[derive(Debug)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base: Url,
    endpoints_url: Url,
    timeout: Duration,
}

impl UpstreamClient {
    /// Build the client. When a trust anchor is supplied it becomes the sole
    /// acceptable CA: built-in system roots are disabled.
    pub fn new(
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
        anchor: Option<TrustAnchor>,
    ) -> Result<Self, UpstreamError> {
        let base = Url::parse(&upstream.base_url).map_err(|source| UpstreamError::BaseUrl {
            url: upstream.base_url.clone(),
            source,
        })?;
        let endpoints_url = endpoints_url(&upstream.base_url)?;

        // Redirects are not followed: anything but a direct 200 from the
        // upstream is a relay failure.
        let timeout = Duration::from_secs(timeouts.upstream_secs);
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(timeout);

        if let Some(anchor) = anchor {
            builder = builder.tls_built_in_root_certs(false);
            for certificate in anchor.into_certificates() {
                builder = builder.add_root_certificate(certificate);
            }
        }

        let http = builder.build().map_err(UpstreamError::Build)?;

        Ok(Self {
            http,
            base,
            endpoints_url,
            timeout,
        })
    }

    /// The configured upstream base address.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Fetch the endpoint-discovery document.
    ///
    /// The body is returned as raw bytes: the document is opaque to the
    /// relay and is never parsed or re-serialized.
    pub async fn fetch_endpoints(&self) -> Result<Bytes, UpstreamError> {
        let response = self
            .http
            .get(self.endpoints_url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(UpstreamError::Status(status));
        }

        response.bytes().await.map_err(|err| self.classify(err))
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Transport(err)
        }
    }
}

/// The discovery document lives at `<base>/api/v1/endpoints`.
fn endpoints_url(base_url: &str) -> Result<Url, UpstreamError> {
    Url::parse(&format!(
        "{}/api/v1/endpoints",
        base_url.trim_end_matches('/')
    ))
    .map_err(|source| UpstreamError::BaseUrl {
        url: base_url.to_string(),
        source,
    })
}
