//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files;
//! every field has a default so a partial file is acceptable.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream origin mirrored by the discovery endpoint.
    pub upstream: UpstreamConfig,

    /// File staging settings.
    pub staging: StagingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base address of the upstream server (e.g., "https://perf.example.com:8443").
    /// The discovery document is fetched from `<base>/api/v1/endpoints`.
    pub base_url: String,

    /// Path to the PEM bundle holding the certificate authority that signs
    /// the upstream's TLS certificate. When set, it is the sole CA accepted
    /// for the upstream connection; when unset, system roots apply.
    pub trust_anchor: Option<PathBuf>,
}

/// File staging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Deployment secret; the first path segment of every staging route.
    pub secret: String,

    /// Directory holding staged files.
    pub directory: PathBuf,

    /// Maximum accepted file size in bytes.
    pub max_file_bytes: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            directory: PathBuf::from("/var/tmp"),
            max_file_bytes: 200 * 1024 * 1024 * 1024,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout for the upstream call, in seconds.
    pub connect_secs: u64,

    /// Total time allowed for one upstream fetch, in seconds.
    pub upstream_secs: u64,

    /// Inbound request timeout for the mirror surface, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 10,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
