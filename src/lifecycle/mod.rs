//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load site → Build telemetry → Load TLS → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Raise flag → Every listener stops accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: content first, then telemetry, then listeners
//! - Shutdown has a grace period: in-flight requests get a few seconds

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{load_site, Site, StartupError};
