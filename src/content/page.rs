//! Article compilation.
//!
//! # Responsibilities
//! - Split an article into title, date and markdown body
//! - Derive the public URL path from the file name
//! - Render the body and compose the final HTML document
//!
//! # Design Decisions
//! - One convention per deployment; the two are never mixed
//! - Compiled bytes are immutable (`Bytes`) and shared by reference
//! - Every failure names the offending file

use std::path::Path;

use askama::Template;
use bytes::Bytes;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

use crate::config::PathConvention;
use crate::content::markdown;
use crate::content::templates::{display_date, PageTemplate};

/// Date format of the metadata line ("02/01/2006").
const METADATA_DATE: &[FormatItem<'static>] = format_description!("[day]/[month]/[year]");

/// Date prefix of dated file names ("2006-01-02").
const FILENAME_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// URL prefix for articles under the metadata convention.
pub const ARTICLE_PREFIX: &str = "/b/";

/// Why an article could not be compiled.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{name}: not a regular file")]
    NotAFile { name: String },
    #[error("{name}: content is not valid UTF-8")]
    Encoding { name: String },
    #[error("{name}: missing date line")]
    MissingDate { name: String },
    #[error("{name}: couldn't parse date {value:?}: {source}")]
    InvalidDate {
        name: String,
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("{name}: couldn't find date in file name; expected yyyy-mm-dd-name")]
    UndatedFileName { name: String },
    #[error("{name}: empty file name")]
    EmptyName { name: String },
    #[error("{name}: template rendering: {source}")]
    Render {
        name: String,
        #[source]
        source: askama::Error,
    },
    #[error("{first} and {second} both map to {path}")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },
}

/// One compiled article.
#[derive(Debug, Clone)]
pub struct Page {
    /// Public URL path (e.g., `/b/hello`).
    pub url_path: String,
    pub title: String,
    pub date: Date,
    /// The complete HTML document, ready to send.
    pub rendered: Bytes,
    /// The markdown source the body was rendered from.
    pub markdown: String,
    /// File name the page was compiled from.
    pub source_name: String,
}

/// Compile one article from its file name and contents.
///
/// `name` may be a full path; only its final component is used.
pub fn compile_page(
    name: &str,
    contents: &[u8],
    convention: PathConvention,
) -> Result<Page, CompileError> {
    let file_name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
        .to_string();

    let text = std::str::from_utf8(contents).map_err(|_| CompileError::Encoding {
        name: file_name.clone(),
    })?;

    let (title, rest) = split_line(text);

    let (url_path, date, markdown) = match convention {
        PathConvention::Metadata => {
            if rest.is_empty() {
                return Err(CompileError::MissingDate { name: file_name });
            }
            let (date_line, body) = split_line(rest);
            let date = parse_metadata_date(&file_name, date_line)?;
            (metadata_path(&file_name)?, date, body)
        }
        PathConvention::DatedFilename => {
            let (path, date) = dated_path(&file_name)?;
            (path, date, rest)
        }
    };

    let body = markdown::render(markdown);
    let document = PageTemplate {
        title,
        date: display_date(date),
        body: &body,
    }
    .render()
    .map_err(|source| CompileError::Render {
        name: file_name.clone(),
        source,
    })?;

    Ok(Page {
        url_path,
        title: title.to_string(),
        date,
        rendered: Bytes::from(document),
        markdown: markdown.to_string(),
        source_name: file_name,
    })
}

/// Split off the first line, tolerating CRLF endings.
fn split_line(text: &str) -> (&str, &str) {
    let (line, rest) = match text.split_once('\n') {
        Some((line, rest)) => (line, rest),
        None => (text, ""),
    };
    (line.strip_suffix('\r').unwrap_or(line), rest)
}

fn parse_metadata_date(name: &str, line: &str) -> Result<Date, CompileError> {
    let value = line.trim();
    if value.is_empty() {
        return Err(CompileError::MissingDate {
            name: name.to_string(),
        });
    }
    Date::parse(value, METADATA_DATE).map_err(|source| CompileError::InvalidDate {
        name: name.to_string(),
        value: value.to_string(),
        source,
    })
}

/// `/b/` + file name without its extension.
fn metadata_path(file_name: &str) -> Result<String, CompileError> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CompileError::EmptyName {
            name: file_name.to_string(),
        })?;
    Ok(format!("{ARTICLE_PREFIX}{stem}"))
}

/// `/YYYY/MM/DD/<rest>` from a `YYYY-MM-DD-<rest>` file name.
fn dated_path(file_name: &str) -> Result<(String, Date), CompileError> {
    let undated = || CompileError::UndatedFileName {
        name: file_name.to_string(),
    };

    let prefix = file_name.get(..10).ok_or_else(undated)?;
    let rest = file_name
        .get(10..)
        .and_then(|r| r.strip_prefix('-'))
        .filter(|r| !r.is_empty())
        .ok_or_else(undated)?;
    let date = Date::parse(prefix, FILENAME_DATE).map_err(|source| CompileError::InvalidDate {
        name: file_name.to_string(),
        value: prefix.to_string(),
        source,
    })?;

    Ok((format!("/{}/{}", prefix.replace('-', "/"), rest), date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn compiles_metadata_article() {
        let page = compile_page(
            "blog/my-first-post.md",
            b"My First Post\n01/02/2023\nHello **world**",
            PathConvention::Metadata,
        )
        .unwrap();

        assert_eq!(page.title, "My First Post");
        assert_eq!(page.date, date!(2023 - 02 - 01));
        assert_eq!(page.url_path, "/b/my-first-post");
        assert_eq!(page.markdown, "Hello **world**");
        assert_eq!(page.source_name, "my-first-post.md");

        let html = std::str::from_utf8(&page.rendered).unwrap();
        assert!(html.contains("<strong>world</strong>"));
        assert!(html.contains("<title>My First Post</title>"));
        assert!(html.contains("Feb 1 2023"));
    }

    #[test]
    fn tolerates_crlf() {
        let page = compile_page("a.md", b"Title\r\n31/12/2020\r\nbody", PathConvention::Metadata)
            .unwrap();
        assert_eq!(page.title, "Title");
        assert_eq!(page.date, date!(2020 - 12 - 31));
    }

    #[test]
    fn name_without_extension() {
        let page = compile_page("notes", b"T\n01/01/2020\n", PathConvention::Metadata).unwrap();
        assert_eq!(page.url_path, "/b/notes");
    }

    #[test]
    fn malformed_date_fails() {
        for contents in [&b"T\n2023-02-01\nbody"[..], b"T\n1/2/2023\nbody", b"T\n32/01/2023\n"] {
            let err = compile_page("a.md", contents, PathConvention::Metadata).unwrap_err();
            assert!(matches!(err, CompileError::InvalidDate { .. }), "{err}");
        }
    }

    #[test]
    fn missing_date_fails() {
        let err = compile_page("a.md", b"Only a title", PathConvention::Metadata).unwrap_err();
        assert!(matches!(err, CompileError::MissingDate { .. }));

        let err = compile_page("a.md", b"Title\n\nbody", PathConvention::Metadata).unwrap_err();
        assert!(matches!(err, CompileError::MissingDate { .. }));
    }

    #[test]
    fn invalid_utf8_fails() {
        let err = compile_page("a.md", b"\xff\xfe\n01/01/2020\n", PathConvention::Metadata)
            .unwrap_err();
        assert!(matches!(err, CompileError::Encoding { .. }));
    }

    #[test]
    fn compiles_dated_filename_article() {
        let page = compile_page(
            "2019-03-04-hello-world.html",
            b"Hello World\nSome *markdown*",
            PathConvention::DatedFilename,
        )
        .unwrap();

        assert_eq!(page.url_path, "/2019/03/04/hello-world.html");
        assert_eq!(page.date, date!(2019 - 03 - 04));
        assert_eq!(page.title, "Hello World");
        assert!(std::str::from_utf8(&page.rendered)
            .unwrap()
            .contains("<em>markdown</em>"));
    }

    #[test]
    fn undated_filename_fails() {
        for name in ["hello.md", "2019-03-04.md", "2019-03-04-", "2019-13-04-x.md"] {
            let err = compile_page(name, b"T\nbody", PathConvention::DatedFilename).unwrap_err();
            assert!(
                matches!(
                    err,
                    CompileError::UndatedFileName { .. } | CompileError::InvalidDate { .. }
                ),
                "{name}: {err}"
            );
        }
    }
}
