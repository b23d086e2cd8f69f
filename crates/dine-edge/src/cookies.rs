//! Token cookie management
//!
//! The http-only cookie pair is the server-observed copy of the session
//! credential. Each cookie expires exactly when its token's `exp` claim
//! says it does, is scoped to the whole application, and never reaches
//! page scripts.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use dine_common::{decode_unverified, AppError};
use dine_core::TokenKind;
use time::OffsetDateTime;

/// Set both token cookies from a freshly issued pair
///
/// # Errors
/// Returns `AppError::InvalidToken` if either token cannot be decoded for
/// its expiry claim.
pub fn set_token_cookies(
    jar: CookieJar,
    access_token: &str,
    refresh_token: &str,
) -> Result<CookieJar, AppError> {
    let access_exp = decode_unverified(access_token)?.exp;
    let refresh_exp = decode_unverified(refresh_token)?.exp;

    Ok(jar
        .add(token_cookie(TokenKind::Access, access_token, access_exp))
        .add(token_cookie(TokenKind::Refresh, refresh_token, refresh_exp)))
}

/// Remove both token cookies
#[must_use]
pub fn clear_token_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(removal_cookie(TokenKind::Access))
        .remove(removal_cookie(TokenKind::Refresh))
}

fn token_cookie(kind: TokenKind, value: &str, exp: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(kind.storage_key(), value.to_string());
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(exp) {
        cookie.set_expires(expires);
    }
    cookie
}

fn removal_cookie(kind: TokenKind) -> Cookie<'static> {
    // Removal must match the path the cookie was set with.
    let mut cookie = Cookie::new(kind.storage_key(), "");
    cookie.set_path("/");
    cookie
}
