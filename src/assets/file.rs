//! Cached file entries and the read handles handed out for them.

use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;

/// Metadata snapshot taken when an entry is first loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl FileInfo {
    pub(crate) fn from_metadata(name: impl Into<String>, metadata: &std::fs::Metadata) -> Self {
        Self {
            name: name.into(),
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }
}

/// One memoized file or directory. Never changes once inserted.
#[derive(Debug)]
pub struct CacheEntry {
    pub path: String,
    pub content: Bytes,
    pub info: FileInfo,
    /// Sorted by name; only present for directories.
    pub listing: Option<Vec<FileInfo>>,
}

/// A read handle over a cached entry.
///
/// Each `open` produces a fresh handle positioned at byte 0, so concurrent
/// or repeated serves never observe each other's read position.
#[derive(Debug)]
pub struct AssetFile {
    entry: Arc<CacheEntry>,
    cursor: Cursor<Bytes>,
}

impl AssetFile {
    pub(crate) fn new(entry: Arc<CacheEntry>) -> Self {
        let cursor = Cursor::new(entry.content.clone());
        Self { entry, cursor }
    }

    pub fn path(&self) -> &str {
        &self.entry.path
    }

    pub fn stat(&self) -> &FileInfo {
        &self.entry.info
    }

    pub fn is_dir(&self) -> bool {
        self.entry.info.is_dir
    }

    /// Directory listing; empty for regular files.
    pub fn read_dir(&self) -> &[FileInfo] {
        self.entry.listing.as_deref().unwrap_or_default()
    }

    /// The whole content, independent of the read position.
    pub fn bytes(&self) -> Bytes {
        self.entry.content.clone()
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }
}

impl Read for AssetFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for AssetFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}
