//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → http::server::track_requests (latency, status, method)
//!     → metrics.rs (counters, histograms)
//!     → logging.rs (one structured line per request)
//!
//! Consumers:
//!     → stdout (compact or JSON)
//!     → /metrics (bearer-gated Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use metrics::Telemetry;
