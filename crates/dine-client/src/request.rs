//! Request executor
//!
//! Performs HTTP calls against the backend API (or the same-origin routing
//! layer), attaches bearer auth from the token store, normalizes the
//! response shape, and turns the reserved status codes into the error
//! taxonomy of [`crate::error`]. An authentication failure triggers the
//! coordinated logout side effect before the caller sees anything.

use std::sync::Arc;

use dine_common::decode_unverified;
use dine_core::TokenKind;
use dine_session::{logout_redirect, Session};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{ApiError, EntityErrorPayload, AUTH_ERROR_STATUS, ENTITY_ERROR_STATUS};

/// Request body
///
/// A JSON body is serialized with a JSON content type; a multipart body is
/// passed through unmodified with no explicit content type, so the
/// transport sets the multipart boundary itself.
pub enum Body {
    Json(Value),
    Multipart(reqwest::multipart::Form),
}

/// Per-request options
#[derive(Default)]
pub struct RequestOptions {
    pub body: Option<Body>,
    pub headers: HeaderMap,
    /// `None` → configured backend base; `Some("")` → the same-origin
    /// routing layer; any other value → that base verbatim
    pub base_url: Option<String>,
}

impl RequestOptions {
    /// Options carrying a JSON body
    #[must_use]
    pub fn json(value: Value) -> Self {
        Self {
            body: Some(Body::Json(value)),
            ..Self::default()
        }
    }

    /// Options carrying a multipart body
    #[must_use]
    pub fn multipart(form: reqwest::multipart::Form) -> Self {
        Self {
            body: Some(Body::Multipart(form)),
            ..Self::default()
        }
    }

    /// Route this request through an explicit base (`""` = same-origin)
    #[must_use]
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }
}

/// Normalized successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub payload: Value,
}

/// Bearer-authenticated HTTP wrapper
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    backend_url: String,
    edge_origin: String,
    session: Arc<Session>,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        session: Arc<Session>,
        backend_url: impl Into<String>,
        edge_origin: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            backend_url: backend_url.into(),
            edge_origin: edge_origin.into(),
            session,
        }
    }

    /// The session this client is bound to
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Execute one HTTP call
    ///
    /// # Errors
    /// - [`ApiError::Validation`] on the reserved entity-error status, with
    ///   the per-field error list
    /// - [`ApiError::Auth`] on the reserved authentication-error status,
    ///   after the coordinated logout ran (client context)
    /// - [`ApiError::Redirect`] on the same status in server context
    /// - [`ApiError::Http`] on any other non-2xx
    /// - [`ApiError::Transport`] when no response was produced
    #[instrument(skip(self, options), fields(method = %method, path = %path))]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let RequestOptions {
            body,
            headers,
            base_url,
        } = options;

        let base = match base_url.as_deref() {
            None => self.backend_url.as_str(),
            Some("") => self.edge_origin.as_str(),
            Some(other) => other,
        };
        let url = join_url(base, path);

        let caller_auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut request = self.http.request(method, &url).headers(headers);

        // Attach bearer auth from the store unless the caller already
        // supplied an Authorization header. Server context has no store.
        if self.session.context().is_client() && caller_auth.is_none() {
            if let Some(access) = self.session.store().get(TokenKind::Access) {
                request = request.bearer_auth(access);
            }
        }

        match body {
            Some(Body::Json(value)) => request = request.json(&value),
            Some(Body::Multipart(form)) => request = request.multipart(form),
            None => {}
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let payload = response.json::<Value>().await.unwrap_or(Value::Null);

        if (200..300).contains(&status) {
            self.mirror_identity_endpoint(path, &payload);
            return Ok(ApiResponse { status, payload });
        }

        match status {
            ENTITY_ERROR_STATUS => {
                let entity: EntityErrorPayload = serde_json::from_value(payload)
                    .unwrap_or_else(|_| EntityErrorPayload {
                        message: "Validation failed".to_string(),
                        errors: Vec::new(),
                    });
                Err(ApiError::Validation {
                    message: entity.message,
                    errors: entity.errors,
                })
            }
            AUTH_ERROR_STATUS => Err(self.handle_auth_failure(caller_auth.as_deref()).await),
            _ => Err(ApiError::Http { status, payload }),
        }
    }

    /// The coordinated logout side effect for an authentication failure
    async fn handle_auth_failure(&self, caller_auth: Option<&str>) -> ApiError {
        if self.session.context().is_client() {
            // Deduplicated: concurrent 401s collapse into one logout call,
            // then a hard navigation to the login entry point.
            self.session.logout().force_logout().await;
            ApiError::Auth
        } else {
            // No browser storage here; hand control back to the routing
            // layer with the stale token for replay verification.
            let stale = caller_auth
                .and_then(|v| v.strip_prefix("Bearer "))
                .unwrap_or_default();
            ApiError::Redirect(logout_redirect(stale))
        }
    }

    /// Mirror the server's cookie-based session into the token store when
    /// an identity endpoint succeeds
    fn mirror_identity_endpoint(&self, path: &str, payload: &Value) {
        if is_login_path(path) {
            let data = &payload["data"];
            if let (Some(access), Some(refresh)) =
                (data["accessToken"].as_str(), data["refreshToken"].as_str())
            {
                self.session.store().set(TokenKind::Access, access);
                self.session.store().set(TokenKind::Refresh, refresh);
                if let Ok(claims) = decode_unverified(access) {
                    self.session.state().set_role(claims.role);
                }
                debug!("Mirrored login token pair into the store");
            }
        } else if is_logout_path(path) {
            self.session.store().clear();
            self.session.state().clear();
            debug!("Cleared store after logout call");
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("backend_url", &self.backend_url)
            .field("edge_origin", &self.edge_origin)
            .finish_non_exhaustive()
    }
}

/// Both identity domains and both origins (backend, local layer) share
/// these suffixes
fn is_login_path(path: &str) -> bool {
    path.ends_with("/auth/login")
}

fn is_logout_path(path: &str) -> bool {
    path.ends_with("/auth/logout")
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
