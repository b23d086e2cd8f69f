//! Route definitions
//!
//! The `/api` surface mirrors the backend's identity endpoints; everything
//! else is a page navigation, gated by the route guard before any page code
//! runs.

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{post, put};
use axum::Router;
use dine_common::endpoints::local;

use crate::guard;
use crate::handlers::auth;
use crate::state::EdgeState;

/// Create the edge router
pub fn create_router(state: EdgeState) -> Router {
    Router::new()
        .route(local::LOGIN, post(auth::login))
        .route(local::LOGOUT, post(auth::logout))
        .route(local::GUEST_LOGIN, post(auth::guest_login))
        .route(local::GUEST_REFRESH_TOKEN, post(auth::guest_refresh_token))
        .route(local::CHANGE_PASSWORD, put(auth::change_password))
        .fallback(page_shell)
        .layer(middleware::from_fn(guard::route_guard))
        .with_state(state)
}

/// Stand-in for page rendering, which belongs to the UI layer; a navigation
/// that reaches this point has passed the guard
async fn page_shell() -> StatusCode {
    StatusCode::OK
}
