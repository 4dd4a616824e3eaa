//! Secret-guarded file staging surface.
//!
//! Producers behind a firewall stage result files here; consumers pull and
//! delete them. Every route carries the deployment secret as its first
//! path segment:
//!
//! ```text
//! GET    /{secret}            → relay status (disk + staged files)
//! DELETE /{secret}            → graceful remote shutdown
//! PUT    /{secret}/{file_id}  → stage a file (id = SHA-256 of content)
//! GET    /{secret}/{file_id}  → download a staged file
//! DELETE /{secret}/{file_id}  → remove a staged file
//! ```

pub mod handlers;

pub use handlers::{download, remove, shutdown, stage, status};
