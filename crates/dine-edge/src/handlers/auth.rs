//! Identity endpoint mirrors
//!
//! Each handler forwards its call to the backend through the request
//! executor, then sets or clears the http-only cookie pair before handing
//! the backend's JSON payload back unchanged. Entity and generic errors
//! re-emit the backend's status and payload shape via [`crate::response`].

use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use dine_client::{
    ApiError, ChangePasswordRequest, GuestLoginRequest, LoginRequest, RefreshTokenRequest,
    RequestOptions,
};
use dine_common::{decode_unverified, endpoints::backend, AppError};
use dine_core::{Role, TokenKind};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{instrument, warn};
use validator::Validate;

use crate::cookies::{clear_token_cookies, set_token_cookies};
use crate::response::{EdgeError, EdgeResult};
use crate::state::EdgeState;

/// Staff login
///
/// POST /api/auth/login
#[instrument(skip(state, jar, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<EdgeState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> EdgeResult<(CookieJar, Json<Value>)> {
    request
        .validate()
        .map_err(|e| EdgeError::Api(ApiError::from_validation(&e)))?;

    let body = serde_json::to_value(&request).map_err(|e| EdgeError::Internal(e.into()))?;
    let response = state
        .client()
        .execute(Method::POST, backend::LOGIN, RequestOptions::json(body))
        .await?;

    let jar = mirror_pair_into_cookies(jar, &response.payload)?;
    Ok((jar, Json(response.payload)))
}

/// Guest login from a scanned table QR code
///
/// POST /api/guest/auth/login
#[instrument(skip(state, jar, request), fields(table = request.table_number))]
pub async fn guest_login(
    State(state): State<EdgeState>,
    jar: CookieJar,
    Json(request): Json<GuestLoginRequest>,
) -> EdgeResult<(CookieJar, Json<Value>)> {
    request
        .validate()
        .map_err(|e| EdgeError::Api(ApiError::from_validation(&e)))?;

    let body = serde_json::to_value(&request).map_err(|e| EdgeError::Internal(e.into()))?;
    let response = state
        .client()
        .execute(Method::POST, backend::GUEST_LOGIN, RequestOptions::json(body))
        .await?;

    let jar = mirror_pair_into_cookies(jar, &response.payload)?;
    Ok((jar, Json(response.payload)))
}

/// Logout
///
/// POST /api/auth/logout
///
/// The backend call invalidates the refresh token server-side; its failure
/// is tolerated. The cookies are cleared regardless so the navigation
/// state cannot get stuck logged in.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<EdgeState>,
    jar: CookieJar,
) -> EdgeResult<(CookieJar, Json<Value>)> {
    let access = jar
        .get(TokenKind::Access.storage_key())
        .map(|c| c.value().to_string());
    let refresh = jar
        .get(TokenKind::Refresh.storage_key())
        .map(|c| c.value().to_string());

    let payload = match refresh {
        None => json!({ "message": "Already logged out" }),
        Some(refresh_token) => {
            let endpoint = match decode_unverified(&refresh_token).ok().map(|c| c.role) {
                Some(Role::Guest) => backend::GUEST_LOGOUT,
                _ => backend::LOGOUT,
            };

            let body = serde_json::to_value(RefreshTokenRequest { refresh_token })
                .map_err(|e| EdgeError::Internal(e.into()))?;

            let mut options = RequestOptions::json(body);
            if let Some(ref access_token) = access {
                if let Ok(value) = HeaderValue::from_str(&format!("Bearer {access_token}")) {
                    options.headers.insert(AUTHORIZATION, value);
                }
            }

            match state.client().execute(Method::POST, endpoint, options).await {
                Ok(response) => response.payload,
                Err(e) => {
                    warn!(error = %e, "Backend logout failed (tolerated)");
                    json!({ "message": "Logged out" })
                }
            }
        }
    };

    Ok((clear_token_cookies(jar), Json(payload)))
}

/// Guest token refresh
///
/// POST /api/guest/auth/refresh-token
///
/// The refresh token lives in an http-only cookie that page scripts cannot
/// read, which is why this mirror exists at all.
#[instrument(skip(state, jar))]
pub async fn guest_refresh_token(
    State(state): State<EdgeState>,
    jar: CookieJar,
) -> EdgeResult<(CookieJar, Json<Value>)> {
    let Some(refresh_token) = jar
        .get(TokenKind::Refresh.storage_key())
        .map(|c| c.value().to_string())
    else {
        return Err(EdgeError::App(AppError::MissingAuth));
    };

    let body = serde_json::to_value(RefreshTokenRequest { refresh_token })
        .map_err(|e| EdgeError::Internal(e.into()))?;
    let response = state
        .client()
        .execute(Method::POST, backend::GUEST_REFRESH_TOKEN, RequestOptions::json(body))
        .await?;

    let jar = mirror_pair_into_cookies(jar, &response.payload)?;
    Ok((jar, Json(response.payload)))
}

/// Change password; the backend rotates the token pair as a side effect,
/// so the cookies rotate with it
///
/// PUT /api/accounts/change-password
#[instrument(skip_all)]
pub async fn change_password(
    State(state): State<EdgeState>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
    Json(request): Json<ChangePasswordRequest>,
) -> EdgeResult<(CookieJar, Json<Value>)> {
    request
        .validate()
        .map_err(|e| EdgeError::Api(ApiError::from_validation(&e)))?;

    let body = serde_json::to_value(&request).map_err(|e| EdgeError::Internal(e.into()))?;
    let mut options = RequestOptions::json(body);

    // Pass the caller's bearer through; fall back to the access cookie for
    // page-originated calls.
    if let Some(auth) = headers.get(axum::http::header::AUTHORIZATION) {
        if let Ok(value) = HeaderValue::from_bytes(auth.as_bytes()) {
            options.headers.insert(AUTHORIZATION, value);
        }
    } else if let Some(access_token) = jar.get(TokenKind::Access.storage_key()).map(|c| c.value()) {
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {access_token}")) {
            options.headers.insert(AUTHORIZATION, value);
        }
    }

    let response = state
        .client()
        .execute(Method::PUT, backend::CHANGE_PASSWORD, options)
        .await?;

    let jar = mirror_pair_into_cookies(jar, &response.payload)?;
    Ok((jar, Json(response.payload)))
}

/// Pull the token pair out of an identity payload and into the cookies
fn mirror_pair_into_cookies(jar: CookieJar, payload: &Value) -> EdgeResult<CookieJar> {
    let data = &payload["data"];
    let (Some(access), Some(refresh)) = (data["accessToken"].as_str(), data["refreshToken"].as_str())
    else {
        return Err(EdgeError::Internal(anyhow::anyhow!(
            "identity payload missing token pair"
        )));
    };

    Ok(set_token_cookies(jar, access, refresh)?)
}
