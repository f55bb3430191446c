//! Signup guard: its own limiter, a longer window and a lockout.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::*;
use std::time::Duration;

const MINUTE: Duration = Duration::from_secs(60);

#[tokio::test]
async fn three_signups_then_an_hour_lockout() {
    let gw = gateway(&[]).await;

    for _ in 0..3 {
        let response = gw.send(signup("1.2.3.4", "founder@example.com")).await;
        assert_status(&response, StatusCode::OK);
        assert_eq!(body_json(response).await["path"], "/api/auth/signup");
        gw.clock.advance(5 * MINUTE);
    }

    // 15 minutes after the first signup the window is still open
    let response = gw.send(signup("1.2.3.4", "founder@example.com")).await;
    assert_status(&response, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "3600");
    assert_eq!(response.headers()["x-ratelimit-limit"], "3");
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Too many signup attempts. Please try again later."
    );

    gw.clock.advance(30 * MINUTE);
    assert_status(
        &gw.send(signup("1.2.3.4", "founder@example.com")).await,
        StatusCode::TOO_MANY_REQUESTS,
    );

    gw.clock.advance(31 * MINUTE);
    assert_status(
        &gw.send(signup("1.2.3.4", "founder@example.com")).await,
        StatusCode::OK,
    );

    let stats = gw.state.signup_limiter.stats();
    let record = stats.records.iter().find(|r| r.key == "1.2.3.4").unwrap();
    assert_eq!(record.count, 1);
    assert!(!record.is_blocked);
}

#[tokio::test]
async fn lockout_is_per_client() {
    let gw = gateway(&[]).await;

    for _ in 0..4 {
        gw.send(signup("1.2.3.4", "founder@example.com")).await;
    }

    assert_status(
        &gw.send(signup("5.6.7.8", "cofounder@example.com")).await,
        StatusCode::OK,
    );
}

#[tokio::test]
async fn signup_limit_is_independent_of_api_limit() {
    let gw = gateway(&[]).await;

    for _ in 0..3 {
        gw.send(signup("1.2.3.4", "founder@example.com")).await;
    }
    assert_status(
        &gw.send(signup("1.2.3.4", "founder@example.com")).await,
        StatusCode::TOO_MANY_REQUESTS,
    );

    // The same client is still well inside its global quota
    assert_status(
        &gw.send(get("/api/dev/progress", "1.2.3.4")).await,
        StatusCode::OK,
    );
    assert_eq!(gw.state.signup_limiter.tracked_keys(), 1);
    assert_eq!(gw.state.api_limiter.tracked_keys(), 1);
}

#[tokio::test]
async fn disposable_email_is_rejected_and_still_counted() {
    let gw = gateway(&[]).await;

    let response = gw.send(signup("1.2.3.4", "spam@mailinator.com")).await;
    assert_status(&response, StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["details"],
        "Temporary email addresses are not allowed"
    );

    let stats = gw.state.signup_limiter.stats();
    assert_eq!(stats.records[0].count, 1);
}

#[tokio::test]
async fn malformed_signup_body_is_bad_request() {
    let gw = gateway(&[]).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/signup")
        .header("origin", APP_ORIGIN)
        .header("content-type", "application/json")
        .body(Body::from("{\"password\":\"no email\"}"))
        .unwrap();

    assert_status(&gw.send(request).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cross_site_signup_never_reaches_the_limiter() {
    let gw = gateway(&[]).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/signup")
        .header("origin", "https://evil.example")
        .header("x-forwarded-for", "1.2.3.4")
        .body(Body::from("{\"email\":\"victim@example.com\"}"))
        .unwrap();

    assert_status(&gw.send(request).await, StatusCode::FORBIDDEN);
    assert_eq!(gw.state.signup_limiter.tracked_keys(), 0);
}
