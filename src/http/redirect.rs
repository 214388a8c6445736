//! Plain-HTTP listener that sends visitors to HTTPS.
//!
//! Only runs when TLS is configured. Unknown hosts get a 404, the same as on
//! the main listener, and the host comparison is ASCII case-insensitive there
//! too.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    Router,
};

use crate::lifecycle::ShutdownSignal;

/// Router answering every request with a 307 to the HTTPS origin.
pub fn router(host: &str) -> Router {
    Router::new()
        .fallback(to_https)
        .with_state(Arc::<str>::from(host))
}

/// Serve the redirector on `listener` until `shutdown` fires.
pub async fn serve(
    listener: std::net::TcpListener,
    host: &str,
    header_read: Duration,
    shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    crate::http::server::serve(router(host), listener, None, header_read, shutdown).await
}

async fn to_https(State(host): State<Arc<str>>, headers: HeaderMap, uri: Uri) -> Response {
    let requested = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()));

    if !requested.is_some_and(|h| h.eq_ignore_ascii_case(&host)) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let target = match uri.query() {
        Some(query) => format!("https://{host}{}?{query}", uri.path()),
        None => format!("https://{host}{}", uri.path()),
    };
    Redirect::temporary(&target).into_response()
}
