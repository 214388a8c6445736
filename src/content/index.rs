//! The immutable content index.
//!
//! # Responsibilities
//! - Compile every article in the pages directory
//! - Sort pages newest first and render the home page and feed
//! - Answer exact path lookups for the dispatcher
//!
//! # Design Decisions
//! - Built once at startup; never mutated afterwards, so lookups need no lock
//! - Any failing article aborts the whole build (no partial content)
//! - Duplicate derived paths are rejected instead of silently overwritten

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use askama::Template;
use bytes::Bytes;

use crate::config::PathConvention;
use crate::content::feed;
use crate::content::page::{compile_page, CompileError, Page};
use crate::content::templates::{display_date, iso_date, IndexEntry, IndexTemplate};

/// Path of the home page.
pub const HOME_PATH: &str = "/";

/// Path of the syndication feed.
pub const FEED_PATH: &str = "/feed.xml";

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

/// A ready-to-send response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub body: Bytes,
    pub content_type: &'static str,
}

/// Site identity used when rendering the home page and feed.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub title: String,
    pub base_url: String,
}

/// Errors from rendering the aggregate documents.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("home page: {0}")]
    Home(#[source] askama::Error),
    #[error("feed: {0}")]
    Feed(String),
}

/// Path → document map holding every article, the home page and the feed.
#[derive(Debug, Default)]
pub struct ContentIndex {
    documents: HashMap<String, Document>,
    /// Newest first.
    pages: Vec<Page>,
}

impl ContentIndex {
    /// Compile every file in `dir`, in file-name order.
    pub fn compile_dir(dir: &Path, convention: PathConvention) -> Result<Vec<Page>, CompileError> {
        let read_err = |source| CompileError::Io {
            name: dir.display().to_string(),
            source,
        };

        let mut entries = fs::read_dir(dir)
            .map_err(read_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut pages = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            let metadata = fs::metadata(&path).map_err(|source| CompileError::Io {
                name: name.clone(),
                source,
            })?;
            if !metadata.is_file() {
                return Err(CompileError::NotAFile { name });
            }

            let contents = fs::read(&path).map_err(|source| CompileError::Io {
                name: name.clone(),
                source,
            })?;
            let page = compile_page(&name, &contents, convention)?;
            tracing::debug!(file = %name, path = %page.url_path, "Compiled article");
            pages.push(page);
        }
        Ok(pages)
    }

    /// Sort pages and register them together with the home page and feed.
    pub fn build(mut pages: Vec<Page>, site: &SiteInfo) -> Result<Self, BuildError> {
        let mut documents = HashMap::with_capacity(pages.len() + 2);
        let mut sources: HashMap<&str, &str> = HashMap::with_capacity(pages.len());

        for page in &pages {
            if let Some(first) = sources.insert(&page.url_path, &page.source_name) {
                return Err(BuildError::Compile(CompileError::DuplicatePath {
                    path: page.url_path.clone(),
                    first: first.to_string(),
                    second: page.source_name.clone(),
                }));
            }
        }
        drop(sources);

        sort_newest_first(&mut pages);

        for page in &pages {
            documents.insert(
                page.url_path.clone(),
                Document {
                    body: page.rendered.clone(),
                    content_type: HTML_CONTENT_TYPE,
                },
            );
        }

        let home = render_home(&pages, &site.title).map_err(BuildError::Index)?;
        documents.insert(
            HOME_PATH.to_string(),
            Document {
                body: Bytes::from(home),
                content_type: HTML_CONTENT_TYPE,
            },
        );

        let rss = feed::render(&pages, site).map_err(BuildError::Index)?;
        documents.insert(
            FEED_PATH.to_string(),
            Document {
                body: Bytes::from(rss),
                content_type: RSS_CONTENT_TYPE,
            },
        );

        Ok(Self { documents, pages })
    }

    /// Exact path lookup.
    pub fn get(&self, path: &str) -> Option<&Document> {
        self.documents.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.documents.contains_key(path)
    }

    /// Compiled articles, newest first.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Number of servable documents (articles, home page and feed).
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Total bytes held in memory across all documents.
    pub fn total_bytes(&self) -> usize {
        self.documents.values().map(|d| d.body.len()).sum()
    }
}

/// Failures while assembling the index.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Descending by date; ties fall back to path order so output is stable.
pub fn sort_newest_first(pages: &mut [Page]) {
    pages.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.url_path.cmp(&b.url_path)));
}

fn render_home(pages: &[Page], title: &str) -> Result<String, IndexError> {
    let entries = pages
        .iter()
        .map(|page| IndexEntry {
            title: &page.title,
            path: &page.url_path,
            date: display_date(page.date),
            iso_date: iso_date(page.date),
        })
        .collect();

    IndexTemplate { title, entries }
        .render()
        .map_err(IndexError::Home)
}
