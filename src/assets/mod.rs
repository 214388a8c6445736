//! Static asset subsystem.
//!
//! # Data Flow
//! ```text
//! /s/<path> (prefix stripped by the dispatcher)
//!     → cache.rs (normalize, lock, hit or load)
//!     → file.rs (AssetFile handle at offset 0)
//!     → http::server (200 with guessed Content-Type, or 404)
//! ```

pub mod cache;
pub mod file;

pub use cache::{AssetCache, AssetError, CacheStats, INDEX_FILE};
pub use file::{AssetFile, CacheEntry, FileInfo};
