//! HTTP relay surface.
//!
//! A thin axum router that relays `GET /<fid>` requests to the storage
//! cluster via [`ContentFetcher`]. Status, headers, and body from the chosen
//! replica pass through to the client; core failures map to 500-class
//! responses (except malformed file ids, which are the client's fault).

use crate::config::HttpConfig;
use crate::error::{CdnError, Result};
use crate::fetch::ContentFetcher;
use axum::body::Body;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, SERVER};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use metrics::counter;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Value of the `Server` response header.
const SERVER_NAME: &str = concat!("cdn-origin/", env!("CARGO_PKG_VERSION"));

/// Request headers forwarded to the volume server, for conditional and
/// range requests.
const FORWARDED_HEADERS: [HeaderName; 4] = [
    HeaderName::from_static("range"),
    HeaderName::from_static("if-range"),
    HeaderName::from_static("if-none-match"),
    HeaderName::from_static("if-modified-since"),
];

#[derive(Clone)]
struct AppState {
    fetcher: ContentFetcher,
}

/// Build the relay router.
pub fn router(fetcher: ContentFetcher) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/*fid", get(serve_file))
        .with_state(AppState { fetcher })
}

/// Run the relay server until the listener fails.
pub async fn run_relay_server(config: HttpConfig, fetcher: ContentFetcher) -> Result<()> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Relay server listening");

    axum::serve(listener, router(fetcher))
        .await
        .map_err(|e| CdnError::Internal(e.to_string()))?;
    Ok(())
}

async fn serve_file(
    State(state): State<AppState>,
    Path(fid): Path<String>,
    RawQuery(query): RawQuery,
    request_headers: HeaderMap,
) -> Response {
    let host = request_headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    counter!("cdn_origin_http_requests_total", "host" => host).increment(1);

    let mut forwarded = HeaderMap::new();
    for name in FORWARDED_HEADERS {
        if let Some(value) = request_headers.get(&name) {
            forwarded.insert(name, value.clone());
        }
    }

    // The full body is buffered before the response is built; relaying
    // objects larger than memory would need a streaming Body wired to the
    // fetcher's writer instead.
    let mut body = Vec::new();
    let result = state
        .fetcher
        .get(
            &mut body,
            &fid,
            Some(&forwarded),
            query.as_deref().unwrap_or(""),
        )
        .await;

    match result {
        Ok((status, headers)) => relay_response(status, headers, body),
        Err(e) => {
            warn!(fid = %fid, err = %e, "failed to retrieve file from cluster");
            error_response(&e)
        }
    }
}

/// Build the client response from the replica's status, headers, and body.
fn relay_response(status: reqwest::StatusCode, headers: HeaderMap, body: Vec<u8>) -> Response {
    let status =
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = Response::builder().status(status);

    if let Some(out) = response.headers_mut() {
        for (name, value) in headers.iter() {
            // The body is re-framed here (non-2xx bodies are not relayed),
            // so framing headers from the replica must not be copied
            if name == "transfer-encoding" || name == "connection" || name == "content-length" {
                continue;
            }
            out.insert(name.clone(), value.clone());
        }
        out.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    }

    response
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn error_response(e: &CdnError) -> Response {
    let status =
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    (
        status,
        [
            (SERVER, HeaderValue::from_static(SERVER_NAME)),
            (
                HeaderName::from_static("content-type"),
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
        ],
        body,
    )
        .into_response()
}
