//! Ordered request dispatch.
//!
//! # Responsibilities
//! - Decide which stage answers a request: metrics, host check, content,
//!   alias, static or not-found
//! - Check the metrics bearer token
//!
//! # Design Decisions
//! - Pure decision over a borrowed request head; all I/O and response
//!   building happens in `server.rs`
//! - Stages are a closed enum evaluated in a fixed order; the first match wins
//! - Metrics come before the host check so scrapers can use any host name
//! - Host names compare ASCII case-insensitively (`Example.COM` matches
//!   `example.com`); this is a deliberate departure from an exact byte match

use std::sync::Arc;

use axum::http::{header, request::Parts};
use subtle::ConstantTimeEq;

use crate::config::SiteConfig;
use crate::content::{AliasTable, ContentIndex, Document};

/// The parts of a request the dispatcher looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestHead<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    /// `Host` header, or the URI authority when the header is absent (HTTP/2).
    pub host: Option<&'a str>,
    pub authorization: Option<&'a str>,
}

impl<'a> RequestHead<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        let header_str = move |name: header::HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
        };
        Self {
            path: parts.uri.path(),
            query: parts.uri.query(),
            host: header_str(header::HOST).or_else(|| parts.uri.authority().map(|a| a.as_str())),
            authorization: header_str(header::AUTHORIZATION),
        }
    }
}

/// Outcome of dispatching one request.
#[derive(Debug, PartialEq)]
pub enum Stage<'a> {
    /// Authorized metrics scrape.
    Metrics,
    /// Metrics path with a missing, malformed or wrong token.
    Unauthorized,
    /// Virtual host does not match the configured one.
    UnknownHost,
    /// Exact hit in the content index.
    Content(&'a Document),
    /// Alias hit; the target already carries the original query.
    Redirect(String),
    /// Path under the static prefix, prefix removed.
    Static(&'a str),
    NotFound,
}

/// Immutable routing state shared by every request.
#[derive(Debug)]
pub struct Dispatcher {
    content: Arc<ContentIndex>,
    aliases: Arc<AliasTable>,
    host: String,
    metrics_path: String,
    token: String,
    static_prefix: String,
}

impl Dispatcher {
    pub fn new(config: &SiteConfig, content: Arc<ContentIndex>, aliases: Arc<AliasTable>) -> Self {
        Self {
            content,
            aliases,
            host: config.site.host.clone(),
            metrics_path: config.metrics.path.clone(),
            token: config.metrics.token.clone(),
            static_prefix: config.site.static_prefix.clone(),
        }
    }

    pub fn decide<'a>(&'a self, head: &RequestHead<'a>) -> Stage<'a> {
        if head.path == self.metrics_path {
            return if self.authorized(head.authorization) {
                Stage::Metrics
            } else {
                Stage::Unauthorized
            };
        }

        if !head
            .host
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.host))
        {
            return Stage::UnknownHost;
        }

        if let Some(document) = self.content.get(head.path) {
            return Stage::Content(document);
        }

        if let Some(target) = self.aliases.redirect_target(head.path, head.query) {
            return Stage::Redirect(target);
        }

        match head.path.strip_prefix(self.static_prefix.as_str()) {
            Some(rest) => Stage::Static(rest),
            None => Stage::NotFound,
        }
    }

    /// `Authorization: Bearer <token>`, split on a single space.
    fn authorized(&self, header: Option<&str>) -> bool {
        let Some(header) = header else {
            return false;
        };
        let parts: Vec<&str> = header.split(' ').collect();
        if parts.len() != 2 || parts[0] != "Bearer" || self.token.is_empty() {
            return false;
        }
        parts[1].as_bytes().ct_eq(self.token.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{compile_page, SiteInfo};
    use crate::config::PathConvention;

    const TOKEN: &str = "s3cret";
    const HOST: &str = "example.com";

    fn dispatcher() -> Dispatcher {
        let mut config = SiteConfig::default();
        config.site.host = HOST.to_string();
        config.metrics.token = TOKEN.to_string();

        let pages = vec![
            compile_page("hello.md", b"Hello\n01/02/2023\nhi", PathConvention::Metadata).unwrap(),
            compile_page("moved.md", b"Moved\n02/02/2023\nx", PathConvention::Metadata).unwrap(),
        ];
        let site = SiteInfo {
            title: "Blog".to_string(),
            base_url: format!("https://{HOST}"),
        };
        let content = ContentIndex::build(pages, &site).unwrap();
        let aliases: AliasTable = [
            ("/old".to_string(), "/b/hello".to_string()),
            ("/b/moved".to_string(), "/elsewhere".to_string()),
        ]
        .into_iter()
        .collect();

        Dispatcher::new(&config, Arc::new(content), Arc::new(aliases))
    }

    fn head(path: &str) -> RequestHead<'_> {
        RequestHead {
            path,
            host: Some(HOST),
            ..Default::default()
        }
    }

    #[test]
    fn content_hit_returns_compiled_bytes() {
        let d = dispatcher();
        let Stage::Content(doc) = d.decide(&head("/b/hello")) else {
            panic!("expected content");
        };
        assert!(std::str::from_utf8(&doc.body).unwrap().contains("Hello"));
        assert!(matches!(d.decide(&head("/")), Stage::Content(_)));
        assert!(matches!(d.decide(&head("/feed.xml")), Stage::Content(_)));
    }

    #[test]
    fn alias_preserves_query() {
        let d = dispatcher();
        let mut req = head("/old");
        req.query = Some("q=1&r=2");
        assert_eq!(d.decide(&req), Stage::Redirect("/b/hello?q=1&r=2".to_string()));
        assert_eq!(d.decide(&head("/old")), Stage::Redirect("/b/hello".to_string()));
    }

    #[test]
    fn content_beats_alias() {
        let d = dispatcher();
        assert!(matches!(d.decide(&head("/b/moved")), Stage::Content(_)));
    }

    #[test]
    fn wrong_host_is_not_found_even_for_content() {
        let d = dispatcher();
        let mut req = head("/b/hello");
        req.host = Some("evil.test");
        assert_eq!(d.decide(&req), Stage::UnknownHost);
        req.host = None;
        assert_eq!(d.decide(&req), Stage::UnknownHost);
        req.host = Some("EXAMPLE.com");
        assert!(matches!(d.decide(&req), Stage::Content(_)));
    }

    #[test]
    fn metrics_requires_exact_bearer_token() {
        let d = dispatcher();
        let with_auth = |auth: Option<&'static str>| RequestHead {
            path: "/metrics",
            host: Some("scraper.internal"),
            authorization: auth,
            ..Default::default()
        };

        assert_eq!(d.decide(&with_auth(None)), Stage::Unauthorized);
        assert_eq!(d.decide(&with_auth(Some("Bearer"))), Stage::Unauthorized);
        assert_eq!(d.decide(&with_auth(Some("Bearer "))), Stage::Unauthorized);
        assert_eq!(d.decide(&with_auth(Some("Bearer s3cret extra"))), Stage::Unauthorized);
        assert_eq!(d.decide(&with_auth(Some("Bearer  s3cret"))), Stage::Unauthorized);
        assert_eq!(d.decide(&with_auth(Some("Basic s3cret"))), Stage::Unauthorized);
        assert_eq!(d.decide(&with_auth(Some("Bearer s3cre"))), Stage::Unauthorized);
        assert_eq!(d.decide(&with_auth(Some("Bearer s3cret"))), Stage::Metrics);
    }

    #[test]
    fn static_prefix_is_stripped() {
        let d = dispatcher();
        assert_eq!(d.decide(&head("/s/css/site.css")), Stage::Static("css/site.css"));
        assert_eq!(d.decide(&head("/s")), Stage::NotFound);
        assert_eq!(d.decide(&head("/nothing")), Stage::NotFound);
    }
}
