//! Edge layer integration tests
//!
//! End-to-end over HTTP: cookie mirroring by the local auth endpoints and
//! the route guard's navigation gating.
//!
//! Run with: cargo test -p integration-tests --test edge_tests

use std::sync::atomic::Ordering;

use dine_common::decode_unverified;
use integration_tests::{expired_refresh_pair, fresh_pair, MockBackend, TestServer};
use dine_core::Role;
use reqwest::StatusCode;
use serde_json::{json, Value};

/// Collect all Set-Cookie headers of a response
fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_fresh_login_sets_cookies_and_passes_payload_through() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();

    let response = server
        .post(
            "/api/auth/login",
            &json!({ "email": "owner@example.com", "password": "secret123" }),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let access_cookie = cookies
        .iter()
        .find(|c| c.starts_with("accessToken="))
        .expect("missing accessToken cookie");
    let refresh_cookie = cookies
        .iter()
        .find(|c| c.starts_with("refreshToken="))
        .expect("missing refreshToken cookie");

    for cookie in [access_cookie, refresh_cookie] {
        assert!(cookie.contains("HttpOnly"), "cookie not http-only: {cookie}");
        assert!(cookie.contains("SameSite=Lax"), "wrong SameSite: {cookie}");
        assert!(cookie.contains("Path=/"), "wrong path: {cookie}");
        assert!(cookie.contains("Expires="), "no expiry: {cookie}");
    }

    // The payload is the backend's, verbatim.
    let payload: Value = response.json().await.unwrap();
    let access_token = payload["data"]["accessToken"].as_str().unwrap();
    assert!(access_cookie.starts_with(&format!("accessToken={access_token}")));

    // Cookie expiry matches the decoded claim.
    let claims = decode_unverified(access_token).unwrap();
    assert!(claims.exp > chrono::Utc::now().timestamp());
}

#[tokio::test]
async fn test_login_entity_error_passes_through() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();

    let response = server
        .post(
            "/api/auth/login",
            &json!({ "email": "owner@example.com", "password": "wrong-password" }),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    // No cookies on a failed login.
    assert!(set_cookies(&response).is_empty());
    let payload: Value = response.json().await.unwrap();
    assert_eq!(payload["errors"][0]["field"], "password");
}

#[tokio::test]
async fn test_logout_clears_cookies_despite_backend() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();
    let pair = fresh_pair(Role::Owner);

    let response = server
        .post(
            "/api/auth/logout",
            &json!({}),
            Some(&format!(
                "accessToken={}; refreshToken={}",
                pair.access_token, pair.refresh_token
            )),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.calls.logout_total(), 1);

    // Removal cookies for both names.
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=;")
        || c.starts_with("accessToken=\"\"")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=;")
        || c.starts_with("refreshToken=\"\"")));
}

#[tokio::test]
async fn test_guest_refresh_rotates_cookies() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();
    let pair = fresh_pair(Role::Guest);

    let response = server
        .post(
            "/api/guest/auth/refresh-token",
            &json!({}),
            Some(&format!("refreshToken={}", pair.refresh_token)),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.calls.guest_refresh.load(Ordering::SeqCst), 1);

    let cookies = set_cookies(&response);
    let payload: Value = response.json().await.unwrap();
    let new_access = payload["data"]["accessToken"].as_str().unwrap();
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("accessToken={new_access}"))));
}

#[tokio::test]
async fn test_guest_refresh_without_cookie_is_unauthorized() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();

    let response = server
        .post("/api/guest/auth/refresh-token", &json!({}), None)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_guard_restricted_without_session() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();

    let response = server.get("/manage/dishes", None).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[reqwest::header::LOCATION],
        "/login?clearTokens=true"
    );
}

#[tokio::test]
async fn test_guard_expired_access_detours_through_refresh_confirmation() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();

    // Refresh cookie with plenty of life left, access cookie absent
    // (already past its expiry, so the browser dropped it).
    let pair = fresh_pair(Role::Owner);
    let response = server
        .get(
            "/manage/dishes",
            Some(&format!("refreshToken={}", pair.refresh_token)),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[reqwest::header::LOCATION],
        format!(
            "/refresh-token?refreshToken={}&redirect=/manage/dishes",
            pair.refresh_token
        )
    );
}

#[tokio::test]
async fn test_guard_authenticated_login_bounces_to_default() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();
    let pair = fresh_pair(Role::Owner);

    let response = server
        .get(
            "/login",
            Some(&format!(
                "accessToken={}; refreshToken={}",
                pair.access_token, pair.refresh_token
            )),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[reqwest::header::LOCATION], "/");
}

#[tokio::test]
async fn test_guard_role_mismatch_bounces_to_default() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();
    let guest = fresh_pair(Role::Guest);

    let response = server
        .get(
            "/manage/orders",
            Some(&format!(
                "accessToken={}; refreshToken={}",
                guest.access_token, guest.refresh_token
            )),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[reqwest::header::LOCATION], "/");
}

#[tokio::test]
async fn test_guard_matching_session_allowed_through() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();
    let pair = fresh_pair(Role::Owner);

    let response = server
        .get(
            "/manage/dishes",
            Some(&format!(
                "accessToken={}; refreshToken={}",
                pair.access_token, pair.refresh_token
            )),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_guard_ignores_api_surface() {
    let backend = MockBackend::spawn().await.unwrap();
    let server = TestServer::start(&backend.url).await.unwrap();

    // An expired session on an /api path must not produce a guard
    // redirect; the endpoint's own auth handling is the authority.
    let pair = expired_refresh_pair(Role::Owner);
    let response = server
        .post(
            "/api/auth/logout",
            &json!({}),
            Some(&format!("refreshToken={}", pair.refresh_token)),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
