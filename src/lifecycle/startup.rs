//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the immutable site: articles, home page, feed, aliases
//! - Build telemetry and start its upkeep task
//! - Bind listeners and run until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and names the stage that failed
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;

use crate::assets::AssetCache;
use crate::config::{ConfigError, SiteConfig};
use crate::content::{AliasError, AliasTable, BuildError, CompileError, ContentIndex, SiteInfo};
use crate::content::index::IndexError;
use crate::http::{redirect, AppState, Dispatcher, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::net::{load_tls_config, TlsError};
use crate::observability::Telemetry;

/// How often histogram buckets are drained.
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// A fatal startup failure, tagged with the stage it happened in.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("parse articles: {0}")]
    Articles(#[source] CompileError),
    #[error("render index: {0}")]
    Index(#[source] IndexError),
    #[error("load aliases: {0}")]
    Aliases(#[from] AliasError),
    #[error("load tls: {0}")]
    Tls(#[from] TlsError),
    #[error("init metrics: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error("bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serve: {0}")]
    Serve(#[source] std::io::Error),
}

impl From<BuildError> for StartupError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Compile(err) => Self::Articles(err),
            BuildError::Index(err) => Self::Index(err),
        }
    }
}

/// Everything built from disk before the first request.
#[derive(Debug, Clone)]
pub struct Site {
    pub content: Arc<ContentIndex>,
    pub aliases: Arc<AliasTable>,
    pub telemetry: Arc<Telemetry>,
}

impl Site {
    /// Handler state for this site; the static cache starts empty.
    pub fn app_state(&self, config: &SiteConfig) -> AppState {
        AppState {
            dispatcher: Arc::new(Dispatcher::new(
                config,
                Arc::clone(&self.content),
                Arc::clone(&self.aliases),
            )),
            assets: Arc::new(AssetCache::new(&config.site.static_dir)),
            telemetry: Arc::clone(&self.telemetry),
        }
    }
}

/// Compile articles, render the index and feed, load aliases, build telemetry.
pub fn load_site(config: &SiteConfig) -> Result<Site, StartupError> {
    let pages = ContentIndex::compile_dir(
        Path::new(&config.site.pages_dir),
        config.site.path_convention,
    )
    .map_err(StartupError::Articles)?;

    let info = SiteInfo {
        title: config.site.title.clone(),
        base_url: config.base_url(),
    };
    let content = ContentIndex::build(pages, &info)?;

    let aliases = AliasTable::load(Path::new(&config.site.alias_file))?;
    if aliases.is_empty() {
        tracing::info!(file = %config.site.alias_file, "Alias table is empty");
    }
    for path in aliases.shadowed_by(&content) {
        tracing::warn!(path, "Alias is shadowed by content and will never redirect");
    }

    let telemetry = Telemetry::new()?;

    tracing::info!(
        pages = content.pages().len(),
        documents = content.document_count(),
        aliases = aliases.len(),
        bytes = content.total_bytes(),
        "Site loaded"
    );

    Ok(Site {
        content: Arc::new(content),
        aliases: Arc::new(aliases),
        telemetry: Arc::new(telemetry),
    })
}

/// Load the TLS config when a certificate and key are configured.
pub async fn load_tls(config: &SiteConfig) -> Result<Option<RustlsConfig>, StartupError> {
    let Some(tls) = &config.listener.tls else {
        return Ok(None);
    };
    let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
    Ok(Some(rustls))
}

/// Bind a listening socket at `address`.
pub fn bind(address: &str) -> Result<std::net::TcpListener, StartupError> {
    std::net::TcpListener::bind(address).map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}

/// Build everything, bind the listeners and serve until a termination signal.
pub async fn run(config: SiteConfig) -> Result<(), StartupError> {
    let site = load_site(&config)?;
    let tls = load_tls(&config).await?;
    site.telemetry.spawn_upkeep(UPKEEP_INTERVAL);

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let listener = bind(&config.listener.bind_address)?;

    let redirector = match tls {
        Some(_) => {
            let redirect_listener = bind(&config.listener.redirect_address)?;
            let host = config.site.host.clone();
            let header_read = Duration::from_secs(config.timeouts.header_read_secs);
            let rx = shutdown.subscribe();
            Some(tokio::spawn(async move {
                redirect::serve(redirect_listener, &host, header_read, rx).await
            }))
        }
        None => None,
    };

    let state = site.app_state(&config);
    let result = HttpServer::new(config, state)
        .run(listener, tls, shutdown.subscribe())
        .await;

    // The main listener is gone either way; take the redirector with it.
    shutdown.trigger();
    if let Some(task) = redirector {
        match task.await {
            Ok(Err(err)) => tracing::warn!(error = %err, "Redirect listener failed"),
            Err(err) => tracing::warn!(error = %err, "Redirect listener task panicked"),
            Ok(Ok(())) => {}
        }
    }

    result.map_err(StartupError::Serve)?;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.metrics.token = "t".to_string();
        config.site.pages_dir = root.join("blog").display().to_string();
        config.site.static_dir = root.join("static").display().to_string();
        config.site.alias_file = root.join("alias.json").display().to_string();
        config
    }

    #[test]
    fn loads_a_small_site() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("blog/a.md"), "A\n01/01/2024\nbody").unwrap();
        std::fs::write(dir.path().join("alias.json"), r#"{"/old": "/b/a"}"#).unwrap();

        let site = load_site(&config(dir.path())).unwrap();
        assert_eq!(site.content.pages().len(), 1);
        assert!(site.content.contains("/b/a"));
        assert_eq!(site.aliases.get("/old"), Some("/b/a"));
    }

    #[test]
    fn errors_name_their_stage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("blog/a.md"), "A\nnot a date\nbody").unwrap();
        let err = load_site(&config(dir.path())).unwrap_err();
        assert!(err.to_string().starts_with("parse articles: "), "{err}");

        std::fs::write(dir.path().join("blog/a.md"), "A\n01/01/2024\nbody").unwrap();
        let err = load_site(&config(dir.path())).unwrap_err();
        assert!(err.to_string().starts_with("load aliases: "), "{err}");

        std::fs::write(dir.path().join("alias.json"), "[1, 2]").unwrap();
        let err = load_site(&config(dir.path())).unwrap_err();
        assert!(matches!(err, StartupError::Aliases(AliasError::Decode(_))));

        std::fs::write(dir.path().join("alias.json"), r#"{"/x": "/a\u0000b"}"#).unwrap();
        let err = load_site(&config(dir.path())).unwrap_err();
        assert!(matches!(err, StartupError::Aliases(AliasError::InvalidTarget { .. })));
    }

    #[test]
    fn missing_pages_dir_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_site(&config(dir.path())).unwrap_err();
        assert!(matches!(err, StartupError::Articles(CompileError::Io { .. })));
    }
}
