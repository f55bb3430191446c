//! Test fixtures: a throwaway upstream app and a gateway wired to it.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use clap::Parser;
use starter_gateway::clock::ManualClock;
use starter_gateway::config::Args;
use starter_gateway::router;
use starter_gateway::state::AppState;
use std::sync::Arc;
use tower::ServiceExt;

pub const APP_ORIGIN: &str = "https://app.example.com";
pub const ADMIN_TOKEN: &str = "test-admin-token";

pub struct TestGateway {
    pub app: Router,
    pub state: Arc<AppState>,
    pub clock: Arc<ManualClock>,
}

impl TestGateway {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

/// Echoes every request back as JSON, standing in for the app.
pub async fn spawn_upstream() -> String {
    let app = Router::new().fallback(|request: Request<Body>| async move {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .unwrap_or_default();
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
        Json(serde_json::json!({
            "method": parts.method.as_str(),
            "path": parts.uri.path(),
            "query": parts.uri.query(),
            "body": String::from_utf8_lossy(&body).to_string(),
            "host": header("host"),
            "forwardedHost": header("x-forwarded-host"),
            "forwardedProto": header("x-forwarded-proto"),
        }))
    });
    serve(app).await
}

/// Answers everything like an auth callback: 307 to the dashboard with a
/// session cookie.
pub async fn spawn_redirecting_upstream() -> String {
    let app = Router::new().fallback(|| async {
        Response::builder()
            .status(StatusCode::TEMPORARY_REDIRECT)
            .header("location", "/dashboard")
            .header("set-cookie", "sb-session=abc; Path=/; HttpOnly")
            .body(Body::empty())
            .unwrap()
    });
    serve(app).await
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A URL nothing is listening on.
pub async fn dead_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub async fn gateway(extra: &[&str]) -> TestGateway {
    let upstream = spawn_upstream().await;
    gateway_for(&upstream, extra)
}

pub fn gateway_for(upstream: &str, extra: &[&str]) -> TestGateway {
    let mut argv = vec!["starter-gateway", "--upstream-url", upstream, "--app-url", APP_ORIGIN];
    argv.extend_from_slice(extra);
    let args = Args::parse_from(argv);

    let clock = Arc::new(ManualClock::default());
    let state = Arc::new(AppState::with_clock(&args, clock.clone()).unwrap());

    TestGateway {
        app: router(state.clone()),
        state,
        clock,
    }
}

pub fn get(uri: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

/// Same-origin JSON POST from `ip`.
pub fn post_json(uri: &str, ip: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("origin", APP_ORIGIN)
        .header("x-forwarded-for", ip)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn signup(ip: &str, email: &str) -> Request<Body> {
    post_json("/api/auth/signup", ip, serde_json::json!({ "email": email, "password": "hunter22" }))
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
