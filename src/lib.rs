//! Relay micro-server for a performance-benchmarking platform.
//!
//! Two surfaces share one listener:
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 BENCH RELAY                  │
//!   Dashboard        │  ┌────────┐   ┌─────────┐   ┌─────────────┐  │
//!   ───────────────► │  │  http  │──►│ mirror  │──►│  upstream   │──┼──► Perf server
//!   GET /api/v1/...  │  │ server │   │ handler │   │   client    │  │    (pinned CA)
//!                    │  └────────┘   └─────────┘   └─────────────┘  │
//!                    │       │                                      │
//!   Agents           │       ▼                                      │
//!   ───────────────► │  ┌─────────┐   ┌─────────┐                   │
//!   /{secret}/...    │  │ staging │──►│  store  │──► staged files   │
//!                    │  └─────────┘   └─────────┘                   │
//!                    └──────────────────────────────────────────────┘
//! ```
//!
//! The mirror relays the upstream's endpoint-discovery document
//! byte-for-byte, validating the upstream TLS certificate against a trust
//! anchor loaded once at startup. The staging surface holds result files
//! named by their SHA-256 digest behind a deployment secret.

// Core subsystems
pub mod config;
pub mod http;
pub mod mirror;
pub mod net;

// File staging
pub mod staging;
pub mod store;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
