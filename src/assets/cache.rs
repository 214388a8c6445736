//! Lazily populated, never-evicted static file cache.
//!
//! # Responsibilities
//! - Resolve request paths safely under the static root
//! - Load a file (or directory snapshot) on first request
//! - Serve every later request for the same path from memory
//!
//! # Design Decisions
//! - One async mutex covers the whole map, held across a miss's disk read;
//!   concurrent misses serialize
//! - A directory is only valid when it contains an `index.html`
//! - No eviction, TTL or invalidation: content is static for the process
//!   lifetime, so memory grows with the set of distinct paths requested

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs;
use tokio::sync::Mutex;

use crate::assets::file::{AssetFile, CacheEntry, FileInfo};

/// Name of the file that makes a directory servable.
pub const INDEX_FILE: &str = "index.html";

/// Why a static path could not be opened. Callers treat all of these as not-found.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("invalid path {0:?}")]
    InvalidPath(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}: directory has no index.html")]
    MissingIndex(String),
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: usize,
    pub disk_loads: u64,
    pub hits: u64,
}

/// Memoizing view over a static directory.
#[derive(Debug)]
pub struct AssetCache {
    root: PathBuf,
    entries: Mutex<HashMap<String, Arc<CacheEntry>>>,
    disk_loads: AtomicU64,
    hits: AtomicU64,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: Mutex::new(HashMap::new()),
            disk_loads: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Open `path` (relative to the static root), loading it on first use.
    pub async fn open(&self, path: &str) -> Result<AssetFile, AssetError> {
        let key = normalize(path).ok_or_else(|| AssetError::InvalidPath(path.to_string()))?;

        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(AssetFile::new(Arc::clone(entry)));
        }

        let entry = Arc::new(self.load(&key).await?);
        self.disk_loads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            path = %key,
            bytes = entry.content.len(),
            is_dir = entry.info.is_dir,
            "Static cache miss"
        );
        entries.insert(key, Arc::clone(&entry));
        Ok(AssetFile::new(entry))
    }

    /// Snapshot entry count, cached bytes and counters.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        CacheStats {
            entries: entries.len(),
            bytes: entries.values().map(|e| e.content.len()).sum(),
            disk_loads: self.disk_loads.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    async fn load(&self, key: &str) -> Result<CacheEntry, AssetError> {
        let io_err = |source| AssetError::Io {
            path: key.to_string(),
            source,
        };

        let full = self.resolve(key);
        let metadata = fs::metadata(&full).await.map_err(io_err)?;
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string());
        let info = FileInfo::from_metadata(name, &metadata);

        if metadata.is_dir() {
            if fs::File::open(full.join(INDEX_FILE)).await.is_err() {
                return Err(AssetError::MissingIndex(key.to_string()));
            }
            let listing = read_listing(&full).await.map_err(io_err)?;
            return Ok(CacheEntry {
                path: key.to_string(),
                content: Bytes::new(),
                info,
                listing: Some(listing),
            });
        }

        let content = fs::read(&full).await.map_err(io_err)?;
        Ok(CacheEntry {
            path: key.to_string(),
            content: Bytes::from(content),
            info,
            listing: None,
        })
    }

    fn resolve(&self, key: &str) -> PathBuf {
        let relative = key.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

async fn read_listing(dir: &Path) -> std::io::Result<Vec<FileInfo>> {
    let mut reader = fs::read_dir(dir).await?;
    let mut listing = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let metadata = entry.metadata().await?;
        listing.push(FileInfo::from_metadata(
            entry.file_name().to_string_lossy(),
            &metadata,
        ));
    }
    listing.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(listing)
}

/// Canonical cache key: leading `/`, no empty or `.` segments, no trailing `/`.
///
/// Returns `None` for any path that tries to climb out of the root.
pub fn normalize(path: &str) -> Option<String> {
    let mut key = String::with_capacity(path.len() + 1);
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || s.contains('\0') => return None,
            s => {
                key.push('/');
                key.push_str(s);
            }
        }
    }
    if key.is_empty() {
        key.push('/');
    }
    Some(key)
}

/// Key of the index file inside a directory key.
pub fn index_key(dir_key: &str) -> String {
    format!("{}/{INDEX_FILE}", dir_key.trim_end_matches('/'))
}
