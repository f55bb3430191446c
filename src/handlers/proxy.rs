use crate::error::{AppError, Result};
use crate::metrics::UPSTREAM_LATENCY;
use crate::state::AppState;
use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, Uri, header},
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

// Connection-scoped headers plus the ones reqwest/hyper recompute
const SKIPPED_HEADERS: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

// Fallback: anything the gateway doesn't handle itself goes to the app
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let body = read_body(body, state.max_body_bytes).await?;
    forward(&state, parts.method, &parts.uri, &parts.headers, body).await
}

pub async fn read_body(body: Body, limit: usize) -> Result<Bytes> {
    to_bytes(body, limit)
        .await
        .map_err(|_| AppError::BadRequest("Request body is too large or unreadable".to_string()))
}

/// Replays a request against the upstream app and relays its answer.
pub async fn forward(
    state: &AppState,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = format!("{}{}", state.upstream_url, path_and_query);

    let start_time = Instant::now();
    let upstream = state
        .client
        .request(method, url)
        .headers(upstream_headers(headers, uri))
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let upstream_headers = forwardable(upstream.headers());
    let bytes = upstream.bytes().await?;
    UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = upstream_headers;
    Ok(response)
}

// Host is dropped on the way out, so the public one travels as
// X-Forwarded-Host. Values set by a proxy in front of us win.
fn upstream_headers(inbound: &HeaderMap, uri: &Uri) -> HeaderMap {
    let mut headers = forwardable(inbound);

    if !headers.contains_key(X_FORWARDED_HOST) {
        let host = inbound
            .get(header::HOST)
            .cloned()
            .or_else(|| uri.authority().and_then(|a| HeaderValue::from_str(a.as_str()).ok()));
        if let Some(host) = host {
            headers.insert(X_FORWARDED_HOST, host);
        }
    }
    if !headers.contains_key(X_FORWARDED_PROTO) {
        let proto = uri.scheme_str().unwrap_or("http");
        if let Ok(proto) = HeaderValue::from_str(proto) {
            headers.insert(X_FORWARDED_PROTO, proto);
        }
    }
    headers
}

fn forwardable(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| !SKIPPED_HEADERS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
