//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! PEM files (cert, key)
//!     → tls.rs (rustls-pemfile parse → RustlsConfig)
//!     → http::server::serve (TLS accept, one request per connection)
//! ```
//!
//! # Design Decisions
//! - TLS is optional; without it the main listener speaks plain HTTP
//! - Sockets are bound by startup and handed over already listening

pub mod tls;

pub use tls::{load_tls_config, TlsError};
