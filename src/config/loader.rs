//! Configuration loading.
//!
//! Sources, in precedence order: CLI flags, `RELAY_*` environment
//! variables (both via clap), an optional TOML file, built-in defaults.

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "bench-relay", version)]
#[command(about = "Endpoint-discovery mirror and result-file staging relay")]
pub struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen address ("<host>:<port>").
    #[arg(long, env = "RELAY_BIND")]
    pub bind: Option<String>,

    /// Upstream base address (e.g. "https://perf.example.com:8443").
    #[arg(long, env = "RELAY_UPSTREAM")]
    pub upstream: Option<String>,

    /// PEM bundle of the CA that signs the upstream TLS certificate.
    #[arg(long, env = "RELAY_TRUST_ANCHOR")]
    pub trust_anchor: Option<PathBuf>,

    /// Deployment secret guarding the staging routes.
    #[arg(long, env = "RELAY_SECRET")]
    pub secret: Option<String>,

    /// Directory for staged files.
    #[arg(long, env = "RELAY_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("staging directory {} does not exist or is not a directory", .0.display())]
    StagingDirectory(PathBuf),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build the relay configuration from the given arguments.
///
/// Loads the TOML file if one was named, applies CLI/env overrides, then
/// validates. The staging directory must already exist; the relay never
/// creates it (spelling the path wrong should not silently stage files
/// somewhere new).
pub fn load(args: &Args) -> Result<RelayConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(upstream) = &args.upstream {
        config.upstream.base_url = upstream.clone();
    }
    if let Some(trust_anchor) = &args.trust_anchor {
        config.upstream.trust_anchor = Some(trust_anchor.clone());
    }
    if let Some(secret) = &args.secret {
        config.staging.secret = secret.clone();
    }
    if let Some(storage_dir) = &args.storage_dir {
        config.staging.directory = storage_dir.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    if !config.staging.directory.is_dir() {
        return Err(ConfigError::StagingDirectory(config.staging.directory.clone()));
    }

    Ok(config)
}
