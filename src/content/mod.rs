//! Content compilation subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (once):
//!     <pages_dir>/*
//!     → page.rs (title, date, path; markdown.rs body; templates.rs document)
//!     → index.rs (sort newest first, home page, feed.rs)
//!     → ContentIndex (immutable path → bytes)
//!
//!     <alias_file>
//!     → alias.rs
//!     → AliasTable (immutable path → target)
//! ```
//!
//! # Design Decisions
//! - Everything here runs before the listener binds; failures are fatal
//! - Outputs are shared via Arc and never mutated, so readers take no lock

pub mod alias;
pub mod feed;
pub mod index;
pub mod markdown;
pub mod page;
pub mod templates;

pub use alias::{AliasError, AliasTable};
pub use index::{BuildError, ContentIndex, Document, SiteInfo, FEED_PATH, HOME_PATH};
pub use page::{compile_page, CompileError, Page};
