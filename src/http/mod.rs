//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs  (Axum setup, middleware, route dispatch)
//!     → request.rs (request ID stamping)
//!     → mirror / staging handlers
//!     → response.rs (error → status mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, RelayServer};
