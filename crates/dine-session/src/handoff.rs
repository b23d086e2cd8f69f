//! Token hand-off verification
//!
//! The client-side token store and the http-only cookies are two copies of
//! the same credential that are not transactionally consistent. When the
//! server-side layer redirects into a confirmation page it passes the token
//! it acted on as a URL parameter; the page must compare that parameter
//! against the local copy before acting, so a stale or replayed redirect
//! cannot affect a session that has already rotated.

use dine_core::TokenKind;

use crate::store::TokenStore;

/// Check a logout hand-off: the `accessToken` parameter must match the
/// store's current access token
#[must_use]
pub fn verify_logout_handoff(store: &TokenStore, access_param: Option<&str>) -> bool {
    match (access_param, store.get(TokenKind::Access)) {
        (Some(param), Some(current)) => param == current,
        _ => false,
    }
}

/// Check a refresh hand-off: the `refreshToken` parameter must match the
/// store's current refresh token
#[must_use]
pub fn verify_refresh_handoff(store: &TokenStore, refresh_param: Option<&str>) -> bool {
    match (refresh_param, store.get(TokenKind::Refresh)) {
        (Some(param), Some(current)) => param == current,
        _ => false,
    }
}
