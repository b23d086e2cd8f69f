//! # dine-edge
//!
//! The same-origin server layer in front of the pages: gates every
//! navigation through the route guard (reading the http-only cookie pair)
//! and fronts the backend's identity endpoints to keep those cookies in
//! step with the client-side token store.

pub mod cookies;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

use dine_common::AppConfig;
use tracing::info;

pub use guard::{evaluate, GuardDecision, TokenCookies};
pub use response::{EdgeError, EdgeResult};
pub use routes::create_router;
pub use state::EdgeState;

/// Bind and serve the edge server
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let address = config.edge.address();
    let state = EdgeState::new(config);
    let router = middleware::apply_middleware(routes::create_router(state));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "Edge server listening");

    axum::serve(listener, router).await?;
    Ok(())
}
