//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router around the dispatcher
//! - Wire up middleware (request ID, tracing, metrics)
//! - Turn dispatch stages into responses
//! - Serve plain or TLS listeners with keep-alive disabled
//!
//! # Design Decisions
//! - A single fallback handler; routing decisions live in `dispatch.rs`
//! - The only deadline is on the connection (request head read); handlers
//!   never time out, so a request never ends in anything but 200/307/401/404
//! - Every static store failure answers 404
//! - Static files carry `Last-Modified` from the metadata cached on first load

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use hyper_util::rt::TokioTimer;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::assets::{cache::index_key, AssetCache, AssetError, AssetFile};
use crate::config::SiteConfig;
use crate::http::dispatch::{Dispatcher, RequestHead, Stage};
use crate::lifecycle::ShutdownSignal;
use crate::observability::Telemetry;

/// Content type of the Prometheus text exposition.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// How long in-flight requests get to finish after shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const X_REQUEST_ID: &str = "x-request-id";

/// IMF-fixdate, the `Last-Modified` format.
const HTTP_DATE: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Application state injected into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub assets: Arc<AssetCache>,
    pub telemetry: Arc<Telemetry>,
}

/// HTTP server for the site.
pub struct HttpServer {
    router: Router,
    config: SiteConfig,
}

impl HttpServer {
    pub fn new(config: SiteConfig, state: AppState) -> Self {
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        let telemetry = Arc::clone(&state.telemetry);
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(middleware::from_fn_with_state(telemetry, track_requests))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: std::net::TcpListener,
        tls: Option<RustlsConfig>,
        shutdown: ShutdownSignal,
    ) -> std::io::Result<()> {
        let header_read = Duration::from_secs(self.config.timeouts.header_read_secs);
        serve(self.router, listener, tls, header_read, shutdown).await
    }
}

/// Serve `router` on an already-bound listener, one request per connection.
///
/// A connection that has not sent its full request head within
/// `header_read` is closed without a response.
pub(crate) async fn serve(
    router: Router,
    listener: std::net::TcpListener,
    tls: Option<RustlsConfig>,
    header_read: Duration,
    shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;
    let scheme = if tls.is_some() { "https" } else { "http" };
    tracing::info!(address = %addr, scheme, "HTTP server starting");

    let handle = Handle::new();
    let watcher = handle.clone();
    tokio::spawn(async move {
        shutdown.wait().await;
        watcher.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    let app = router.into_make_service_with_connect_info::<SocketAddr>();
    match tls {
        Some(tls) => {
            let mut server = axum_server::from_tcp_rustls(listener, tls).handle(handle);
            server
                .http_builder()
                .http1()
                .keep_alive(false)
                .timer(TokioTimer::new())
                .header_read_timeout(header_read);
            server.serve(app).await?;
        }
        None => {
            let mut server = axum_server::from_tcp(listener).handle(handle);
            server
                .http_builder()
                .http1()
                .keep_alive(false)
                .timer(TokioTimer::new())
                .header_read_timeout(header_read);
            server.serve(app).await?;
        }
    }

    tracing::info!(address = %addr, "HTTP server stopped");
    Ok(())
}

/// Record latency, status and method for every request, then log it.
async fn track_requests(
    State(telemetry): State<Arc<Telemetry>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status();
    telemetry.record_request(&method, status, elapsed);
    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = status.as_u16(),
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "Served request"
    );
    response
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, _body) = request.into_parts();
    let head = RequestHead::from_parts(&parts);

    match state.dispatcher.decide(&head) {
        Stage::Metrics => {
            state
                .telemetry
                .observe_static_cache(&state.assets.stats().await);
            (
                [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
                state.telemetry.render(),
            )
                .into_response()
        }
        Stage::Unauthorized => {
            tracing::warn!(path = %head.path, "Metrics request rejected");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Stage::UnknownHost => {
            tracing::warn!(
                host = head.host.unwrap_or(""),
                path = %head.path,
                "Request for unknown host"
            );
            StatusCode::NOT_FOUND.into_response()
        }
        Stage::Content(document) => (
            [(header::CONTENT_TYPE, document.content_type)],
            document.body.clone(),
        )
            .into_response(),
        Stage::Redirect(target) => Redirect::temporary(&target).into_response(),
        Stage::Static(path) => serve_static(&state.assets, path).await,
        Stage::NotFound => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve_static(assets: &AssetCache, path: &str) -> Response {
    match open_servable(assets, path).await {
        Ok(file) => {
            let mime = mime_guess::from_path(file.path()).first_or_octet_stream();
            let mut response =
                ([(header::CONTENT_TYPE, mime.as_ref())], file.bytes()).into_response();
            if let Some(modified) = file.stat().modified.and_then(http_date) {
                if let Ok(value) = header::HeaderValue::from_str(&modified) {
                    response.headers_mut().insert(header::LAST_MODIFIED, value);
                }
            }
            response
        }
        Err(err) => {
            tracing::debug!(path, error = %err, "Static lookup failed");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn http_date(at: SystemTime) -> Option<String> {
    OffsetDateTime::from(at).format(HTTP_DATE).ok()
}

/// Directories are answered with their `index.html`, through the same cache.
async fn open_servable(assets: &AssetCache, path: &str) -> Result<AssetFile, AssetError> {
    let file = assets.open(path).await?;
    if file.is_dir() {
        return assets.open(&index_key(file.path())).await;
    }
    Ok(file)
}
