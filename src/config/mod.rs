//! Relay configuration.
//!
//! One immutable [`RelayConfig`] is built at process start from CLI flags,
//! `RELAY_*` environment variables, and an optional TOML file, then passed
//! explicitly into the server. Nothing reads configuration after startup.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, Args, ConfigError};
pub use schema::RelayConfig;
