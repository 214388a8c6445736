//! Page and home templates.
//!
//! Templates are compiled into the binary by askama, so there is no
//! runtime registry to populate or share.

use askama::Template;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::Date;

/// Human-readable date shown on pages and the home listing ("Jan 2 2006").
pub const DISPLAY_DATE: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none] [year]");

/// Machine-readable date for `<time datetime>`.
pub const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// One rendered article.
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate<'a> {
    pub title: &'a str,
    pub date: String,
    pub body: &'a str,
}

/// One line of the home listing.
pub struct IndexEntry<'a> {
    pub title: &'a str,
    pub path: &'a str,
    pub date: String,
    pub iso_date: String,
}

/// The home page listing every article.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    pub entries: Vec<IndexEntry<'a>>,
}

/// Format a date for display, falling back to ISO form.
pub fn display_date(date: Date) -> String {
    date.format(DISPLAY_DATE)
        .unwrap_or_else(|_| date.to_string())
}

/// Format a date as `YYYY-MM-DD`.
pub fn iso_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}
