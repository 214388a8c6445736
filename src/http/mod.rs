//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (keep-alive off)
//!     → server.rs (request ID, trace span, track_requests)
//!     → dispatch.rs (metrics → host → content → alias → static → 404)
//!     → server.rs (stage → response)
//!     → Send to client
//!
//! With TLS, redirect.rs answers plain HTTP with 307 → https://<host>.
//! ```

pub mod dispatch;
pub mod redirect;
pub mod server;

pub use dispatch::{Dispatcher, RequestHead, Stage};
pub use server::{AppState, HttpServer};
