//! memsite: a small personal website served entirely from memory.
//!
//! # Architecture Overview
//!
//! ```text
//!   startup                       per request
//!   ───────                       ───────────
//!   blog/*  ─▶ content::page ─┐   request id → trace → track_requests
//!                             ├─▶ http::dispatch
//!   content::index (home,feed)┘     1. /metrics (bearer)
//!   alias.json ─▶ content::alias    2. host check
//!                                   3. content index
//!   static/ ◀── assets::cache ◀──   4. alias 307
//!                                   5. /s/ static
//!                                   6. 404
//! ```

pub mod assets;
pub mod config;
pub mod content;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
