//! Test helpers
//!
//! Provides the mock backend, a test server for the edge layer, and a
//! recording navigator for asserting hard-navigation side effects.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use dine_common::{
    AppConfig, AppSettings, BackendConfig, ChannelConfig, Environment, ServerConfig, SessionConfig,
    TokenIssuer,
};
use dine_core::Role;
use dine_edge::EdgeState;
use dine_session::{Navigator, Session};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::fixtures::{test_issuer, TEST_SECRET};

/// Navigator that records every target for assertions
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, location: &str) {
        self.visited.lock().push(location.to_string());
    }
}

/// Call counters of the mock backend
#[derive(Debug, Default)]
pub struct BackendCalls {
    pub login: AtomicUsize,
    pub guest_login: AtomicUsize,
    pub refresh: AtomicUsize,
    pub guest_refresh: AtomicUsize,
    pub logout: AtomicUsize,
    pub guest_logout: AtomicUsize,
    pub protected: AtomicUsize,
    /// When set, the refresh endpoints answer 500
    pub fail_refresh: AtomicBool,
}

impl BackendCalls {
    pub fn refresh_total(&self) -> usize {
        self.refresh.load(Ordering::SeqCst) + self.guest_refresh.load(Ordering::SeqCst)
    }

    pub fn logout_total(&self) -> usize {
        self.logout.load(Ordering::SeqCst) + self.guest_logout.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct MockState {
    issuer: TokenIssuer,
    calls: Arc<BackendCalls>,
    refresh_delay: Duration,
}

/// Mock remote backend
pub struct MockBackend {
    pub addr: SocketAddr,
    pub url: String,
    pub calls: Arc<BackendCalls>,
    pub issuer: TokenIssuer,
    _handle: JoinHandle<()>,
}

impl MockBackend {
    /// Spawn with no artificial latency
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with_delay(Duration::ZERO).await
    }

    /// Spawn with artificial latency on the refresh endpoints, so tests can
    /// overlap callers while a refresh is in flight
    pub async fn spawn_with_delay(refresh_delay: Duration) -> Result<Self> {
        let calls = Arc::new(BackendCalls::default());
        let issuer = test_issuer();
        let state = MockState {
            issuer: issuer.clone(),
            calls: Arc::clone(&calls),
            refresh_delay,
        };

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/guest/auth/login", post(guest_login))
            .route("/auth/refresh-token", post(refresh_token))
            .route("/guest/auth/refresh-token", post(guest_refresh_token))
            .route("/auth/logout", post(logout))
            .route("/guest/auth/logout", post(guest_logout))
            .route("/accounts/change-password", put(change_password))
            .route("/protected", get(protected))
            .route("/echo-auth", get(echo_auth))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            url: format!("http://{addr}"),
            addr,
            calls,
            issuer,
            _handle: handle,
        })
    }
}

fn auth_payload(issuer: &TokenIssuer, role: Role) -> Value {
    let pair = issuer.issue_pair("1", role).unwrap();
    let profile = match role {
        Role::Guest => json!({
            "guest": {
                "id": 7,
                "name": "Table 4",
                "tableNumber": 4,
                "role": "Guest",
                "createdAt": "2026-08-01T10:00:00Z"
            }
        }),
        _ => json!({
            "account": {
                "id": 1,
                "name": "An",
                "email": "owner@example.com",
                "role": role.as_str()
            }
        }),
    };

    let mut data = json!({
        "accessToken": pair.access_token,
        "refreshToken": pair.refresh_token,
    });
    data.as_object_mut()
        .unwrap()
        .extend(profile.as_object().unwrap().clone());

    json!({ "message": "OK", "data": data })
}

async fn login(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.calls.login.fetch_add(1, Ordering::SeqCst);
    if body["password"] == "wrong-password" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "message": "Validation error",
                "errors": [{ "field": "password", "message": "Incorrect password" }]
            })),
        )
            .into_response();
    }
    Json(auth_payload(&state.issuer, Role::Owner)).into_response()
}

async fn guest_login(State(state): State<MockState>, Json(_body): Json<Value>) -> Response {
    state.calls.guest_login.fetch_add(1, Ordering::SeqCst);
    Json(auth_payload(&state.issuer, Role::Guest)).into_response()
}

async fn refresh_token(State(state): State<MockState>, Json(_body): Json<Value>) -> Response {
    state.calls.refresh.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.refresh_delay).await;
    if state.calls.fail_refresh.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        )
            .into_response();
    }
    let pair = state.issuer.issue_pair("1", Role::Owner).unwrap();
    Json(json!({
        "message": "Refresh successful",
        "data": { "accessToken": pair.access_token, "refreshToken": pair.refresh_token }
    }))
    .into_response()
}

async fn guest_refresh_token(State(state): State<MockState>, Json(_body): Json<Value>) -> Response {
    state.calls.guest_refresh.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.refresh_delay).await;
    if state.calls.fail_refresh.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "boom" })),
        )
            .into_response();
    }
    let pair = state.issuer.issue_pair("7", Role::Guest).unwrap();
    Json(json!({
        "message": "Refresh successful",
        "data": { "accessToken": pair.access_token, "refreshToken": pair.refresh_token }
    }))
    .into_response()
}

async fn logout(State(state): State<MockState>) -> Response {
    state.calls.logout.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "message": "Logout successful" })).into_response()
}

async fn guest_logout(State(state): State<MockState>) -> Response {
    state.calls.guest_logout.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "message": "Logout successful" })).into_response()
}

async fn change_password(State(state): State<MockState>, Json(_body): Json<Value>) -> Response {
    Json(auth_payload(&state.issuer, Role::Owner)).into_response()
}

/// Always answers with the reserved authentication-error status
async fn protected(State(state): State<MockState>) -> Response {
    state.calls.protected.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Token expired" })),
    )
        .into_response()
}

/// Echoes the Authorization header back, for bearer-attach assertions
async fn echo_auth(headers: HeaderMap) -> Response {
    let authorization = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Json(json!({ "message": "OK", "data": { "authorization": authorization } })).into_response()
}

/// Test server running the edge router against a mock backend
pub struct TestServer {
    pub addr: SocketAddr,
    pub url: String,
    pub client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the edge layer in front of the given backend URL
    pub async fn start(backend_url: &str) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = AppConfig {
            app: AppSettings {
                name: "dine-test".to_string(),
                env: Environment::Development,
            },
            backend: BackendConfig {
                url: backend_url.to_string(),
            },
            edge: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: addr.port(),
            },
            session: SessionConfig {
                refresh_cadence_ms: 1000,
            },
            channel: ChannelConfig {
                url: "ws://127.0.0.1:1/ws".to_string(),
                reconnect_base_ms: 100,
                reconnect_max_ms: 1000,
            },
        };

        let router = dine_edge::create_router(EdgeState::new(config));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        // Redirects are assertions, not something to follow.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            url: format!("http://{addr}"),
            addr,
            client,
            _handle: handle,
        })
    }

    /// GET a path, optionally with a Cookie header
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Result<reqwest::Response> {
        let mut request = self.client.get(format!("{}{path}", self.url));
        if let Some(cookie) = cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        Ok(request.send().await?)
    }

    /// POST a JSON body, optionally with a Cookie header
    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        cookie: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self.client.post(format!("{}{path}", self.url)).json(body);
        if let Some(cookie) = cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        Ok(request.send().await?)
    }
}

/// A client-context session wired to the mock backend
pub fn client_session(backend_url: &str, navigator: Arc<RecordingNavigator>) -> Arc<Session> {
    Session::builder(backend_url).navigator(navigator).build()
}

/// Poll until `predicate` holds or the timeout elapses
pub async fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}

/// The signing secret, re-exported for tests that issue their own tokens
pub fn signing_secret() -> &'static str {
    TEST_SECRET
}
