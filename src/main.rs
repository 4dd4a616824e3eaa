use clap::Parser;
use tokio::net::TcpListener;

use bench_relay::config::{self, Args};
use bench_relay::net::tls;
use bench_relay::observability::{logging, metrics};
use bench_relay::RelayServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = config::load(&args)?;

    logging::init(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bench-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        storage_dir = %config.staging.directory.display(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    // The trust anchor is loaded exactly once; an unreadable bundle is fatal
    // here rather than on the first mirrored request.
    let anchor = match &config.upstream.trust_anchor {
        Some(path) => {
            let anchor = tls::load_trust_anchor(path)?;
            tracing::info!(
                path = %anchor.path().display(),
                certificates = anchor.len(),
                "Trust anchor loaded"
            );
            Some(anchor)
        }
        None => {
            tracing::warn!("No trust anchor configured; upstream TLS uses system roots");
            None
        }
    };

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let server = RelayServer::new(config, anchor)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
