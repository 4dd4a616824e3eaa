//! Configuration validation.
//!
//! Semantic validation on top of what serde already guarantees. All errors
//! are collected and reported together, not just the first.

use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("upstream.base_url must be set")]
    MissingUpstreamBase,

    #[error("upstream.base_url {0:?} is not a valid http(s) URL")]
    InvalidUpstreamBase(String),

    #[error("staging.secret must not be empty")]
    EmptySecret,

    #[error("staging.max_file_bytes must be greater than zero")]
    ZeroMaxFileBytes,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.upstream.base_url.is_empty() {
        errors.push(ValidationError::MissingUpstreamBase);
    } else {
        match Url::parse(&config.upstream.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => errors.push(ValidationError::InvalidUpstreamBase(
                config.upstream.base_url.clone(),
            )),
        }
    }

    if config.staging.secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }
    if config.staging.max_file_bytes == 0 {
        errors.push(ValidationError::ZeroMaxFileBytes);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
