//! Network trust material.

pub mod tls;

pub use tls::{load_trust_anchor, TrustAnchor, TrustAnchorError};
