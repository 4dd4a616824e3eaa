//! Endpoint-discovery mirror.
//!
//! # Data Flow
//! ```text
//! GET /api/v1/endpoints
//!     → handler.rs (log upstream base, dispatch)
//!     → client.rs  (HTTPS GET <base>/api/v1/endpoints, pinned CA)
//!     → 200 + upstream body, byte-for-byte
//!       or 502 / 504 with the failure classified
//! ```

pub mod client;
pub mod handler;

pub use client::{UpstreamClient, UpstreamError};
