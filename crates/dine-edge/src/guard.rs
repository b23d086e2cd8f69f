//! Route guard
//!
//! Synchronous interception of every navigation, ahead of any page code.
//! The decision reads only the http-only cookie pair, never the
//! client-side token store, which a server cannot see. Role decoding is
//! best-effort structural decoding; a malformed cookie means "no valid
//! role", never a routing crash.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use dine_common::{decode_unverified, endpoints::pages};
use dine_core::{Role, TokenKind};
use tracing::debug;

/// The cookie pair as seen by the guard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCookies {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl TokenCookies {
    /// Read the two token cookies from a request's jar
    #[must_use]
    pub fn from_jar(jar: &CookieJar) -> Self {
        Self {
            access: jar
                .get(TokenKind::Access.storage_key())
                .map(|c| c.value().to_string()),
            refresh: jar
                .get(TokenKind::Refresh.storage_key())
                .map(|c| c.value().to_string()),
        }
    }
}

/// Outcome of one guard evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        location: String,
        /// The login page should also drop the client-side token copies
        clear_tokens: bool,
    },
}

/// Path groups the guard distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathClass {
    /// Unauthenticated entry (login)
    Public,
    /// Guest-restricted pages (table ordering)
    GuestOnly,
    /// Staff-restricted pages (management)
    ManageOnly,
    /// Neither
    Open,
}

fn classify(path: &str) -> PathClass {
    if path == pages::LOGIN || path.starts_with("/login/") {
        PathClass::Public
    } else if path == pages::GUEST_PREFIX || path.starts_with("/guest/") {
        PathClass::GuestOnly
    } else if path == pages::MANAGE_PREFIX || path.starts_with("/manage/") {
        PathClass::ManageOnly
    } else {
        PathClass::Open
    }
}

/// Evaluate the guard decision table for one navigation
#[must_use]
pub fn evaluate(path: &str, cookies: &TokenCookies) -> GuardDecision {
    let class = classify(path);
    let restricted = matches!(class, PathClass::GuestOnly | PathClass::ManageOnly);

    let Some(refresh) = cookies.refresh.as_deref() else {
        if restricted {
            // Not logged in: back to login, flagging the client to drop
            // its own token copies too.
            return GuardDecision::Redirect {
                location: format!("{}?clearTokens=true", pages::LOGIN),
                clear_tokens: true,
            };
        }
        return GuardDecision::Allow;
    };

    if class == PathClass::Public {
        // Already authenticated; nothing to do on the login page.
        return GuardDecision::Redirect {
            location: pages::DEFAULT.to_string(),
            clear_tokens: false,
        };
    }

    if restricted && cookies.access.is_none() {
        // Access cookie lapsed while the refresh cookie lives on: detour
        // through the refresh confirmation page, carrying the original
        // target so the flow can land back where it started.
        return GuardDecision::Redirect {
            location: format!(
                "{}?refreshToken={refresh}&redirect={path}",
                pages::REFRESH_TOKEN
            ),
            clear_tokens: false,
        };
    }

    let role = decode_unverified(refresh).ok().map(|claims| claims.role);
    match (role, class) {
        (Some(Role::Guest), PathClass::ManageOnly) => GuardDecision::Redirect {
            location: pages::DEFAULT.to_string(),
            clear_tokens: false,
        },
        (Some(role), PathClass::GuestOnly) if !role.is_guest() => GuardDecision::Redirect {
            location: pages::DEFAULT.to_string(),
            clear_tokens: false,
        },
        _ => GuardDecision::Allow,
    }
}

/// Axum middleware applying the guard to every page navigation
///
/// The `/api` surface is the routing layer itself, not a page; it is never
/// gated here.
pub async fn route_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if path.starts_with("/api/") {
        return next.run(request).await;
    }

    match evaluate(&path, &TokenCookies::from_jar(&jar)) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect { location, .. } => {
            debug!(path = %path, location = %location, "Navigation redirected");
            Redirect::temporary(&location).into_response()
        }
    }
}
