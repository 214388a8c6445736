//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use memsite::config::SiteConfig;
use memsite::http::HttpServer;
use memsite::lifecycle::{load_site, Shutdown};
use tempfile::TempDir;

pub const TOKEN: &str = "scrape-me";
pub const HOST: &str = "example.com";

/// A site on disk plus the config pointing at it.
pub struct TestSite {
    pub dir: TempDir,
    pub config: SiteConfig,
}

/// Three articles, a few static files and some aliases.
pub fn build_site(host: &str) -> TestSite {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "blog/first.md", "My First Post\n01/02/2023\nHello **world**\n");
    write(root, "blog/second.md", "Second Post\n15/03/2023\nMore *words*.\n");
    write(root, "blog/oldest.md", "Oldest Post\n10/01/2022\nHistory.\n");

    write(root, "static/css/site.css", "body { margin: 0 }");
    write(root, "static/docs/index.html", "<h1>docs</h1>");
    write(root, "static/bare/readme.txt", "no index here");

    write(
        root,
        "alias.json",
        r#"{
            "/old": "/b/first",
            "/b/second": "/never-used",
            "/away": "https://elsewhere.example/x"
        }"#,
    );

    let mut config = SiteConfig::default();
    config.site.host = host.to_string();
    config.site.title = "Test Site".to_string();
    config.site.pages_dir = root.join("blog").display().to_string();
    config.site.static_dir = root.join("static").display().to_string();
    config.site.alias_file = root.join("alias.json").display().to_string();
    config.metrics.token = TOKEN.to_string();

    TestSite { dir, config }
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Fully layered router for `site`, driven without a socket.
pub fn router(site: &TestSite) -> Router {
    let loaded = load_site(&site.config).unwrap();
    HttpServer::new(site.config.clone(), loaded.app_state(&site.config)).router()
}

/// A real server on an ephemeral port. Keep `shutdown` alive for the test.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub site: TestSite,
    pub shutdown: Shutdown,
    pub task: tokio::task::JoinHandle<std::io::Result<()>>,
}

pub async fn start_server() -> RunningServer {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let site = build_site(&addr.to_string());

    let loaded = load_site(&site.config).unwrap();
    let server = HttpServer::new(site.config.clone(), loaded.app_state(&site.config));
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let task = tokio::spawn(async move { server.run(listener, None, rx).await });

    // The socket is already listening; give the accept loop a moment.
    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningServer {
        addr,
        site,
        shutdown,
        task,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
