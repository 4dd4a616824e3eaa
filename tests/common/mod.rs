//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use bench_relay::net::tls::TrustAnchor;
use bench_relay::{RelayConfig, RelayServer, Shutdown};
use sha2::{Digest, Sha256};
use tokio::task::JoinHandle;

/// Secret used by every test deployment.
#[allow(dead_code)]
pub const TEST_SECRET: &str = "ThisIsMyServerSecret";

/// Path of a file under `tests/fixtures/`.
#[allow(dead_code)]
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// A relay configuration pointing at the given upstream, with short
/// timeouts suitable for tests.
pub fn relay_config(upstream: &str, storage_dir: &Path) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.upstream.base_url = upstream.to_string();
    config.staging.secret = TEST_SECRET.to_string();
    config.staging.directory = storage_dir.to_path_buf();
    config.timeouts.connect_secs = 2;
    config.timeouts.upstream_secs = 1;
    config.timeouts.request_secs = 5;
    config
}

/// Spawn a relay on an ephemeral port.
pub async fn spawn_relay(
    config: RelayConfig,
    anchor: Option<TrustAnchor>,
) -> (SocketAddr, Shutdown, JoinHandle<Result<(), std::io::Error>>) {
    // The test binary links two rustls crypto backends (reqwest brings
    // ring, axum-server brings aws-lc-rs); pick one process-wide before
    // any TLS config is built.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let server = RelayServer::new(config, anchor).expect("failed to build relay server");
    let shutdown = server.shutdown_handle();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(server.run(listener));
    (addr, shutdown, handle)
}

/// Lowercase hex SHA-256 digest of `data`.
#[allow(dead_code)]
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
