//! Legacy-URL redirect table.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use axum::http::HeaderValue;

use crate::content::index::ContentIndex;

/// Error type for alias loading.
#[derive(Debug, thiserror::Error)]
pub enum AliasError {
    #[error("opening alias file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("alias json decoding: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("alias {path}: target {target:?} is not a valid Location header")]
    InvalidTarget { path: String, target: String },
}

/// Immutable map from an old path to a redirect target (path or absolute URL).
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// Load a JSON object of `"old-path": "target"` pairs.
    pub fn load(path: &Path) -> Result<Self, AliasError> {
        let raw = fs::read_to_string(path).map_err(|source| AliasError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Decode the table; every target must be usable as a `Location` header.
    pub fn from_json(raw: &str) -> Result<Self, AliasError> {
        let entries: HashMap<String, String> = serde_json::from_str(raw)?;
        if let Some((path, target)) = entries
            .iter()
            .find(|(_, target)| HeaderValue::from_str(target).is_err())
        {
            return Err(AliasError::InvalidTarget {
                path: path.clone(),
                target: target.clone(),
            });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// The redirect target for `path`, with the original query re-appended.
    pub fn redirect_target(&self, path: &str, query: Option<&str>) -> Option<String> {
        let target = self.get(path)?;
        Some(match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{target}?{query}"),
            None => target.to_string(),
        })
    }

    /// Aliases that can never fire because a content path takes precedence.
    pub fn shadowed_by<'a>(&'a self, content: &ContentIndex) -> Vec<&'a str> {
        let mut shadowed: Vec<_> = self
            .entries
            .keys()
            .map(String::as_str)
            .filter(|path| content.contains(path))
            .collect();
        shadowed.sort_unstable();
        shadowed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for AliasTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
