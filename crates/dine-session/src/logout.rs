//! Coordinated logout
//!
//! The single place that ends a client-side session: notify the backend to
//! invalidate the refresh token (failure tolerated), clear the token store
//! and the role mirror, emit the session-ended event, and hard-navigate
//! away. Concurrent triggers (several requests hitting an auth failure at
//! once, or the channel's logout signal racing a 401) collapse into one
//! logout network call through the same single-flight pattern the refresh
//! coordinator uses.
//!
//! The server-rendering context cannot touch browser storage; there the
//! executor hands control back to the routing layer with
//! [`logout_redirect`], carrying the stale access token so the logout
//! confirmation page can verify it against current state before acting.

use std::sync::Arc;

use dine_common::{decode_unverified, endpoints::{backend, pages}};
use dine_core::{Role, TokenKind};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::events::{SessionEndReason, SessionEvent, SessionEvents};
use crate::session::Navigator;
use crate::state::SessionState;
use crate::store::TokenStore;

type InFlight = Shared<BoxFuture<'static, ()>>;

/// Build the logout confirmation redirect for the server-rendering context
///
/// The stale access token rides along as a query parameter so the
/// confirmation page can refuse a replayed redirect whose token no longer
/// matches the client's current pair.
#[must_use]
pub fn logout_redirect(stale_access_token: &str) -> String {
    format!(
        "{}?accessToken={}",
        pages::LOGOUT,
        stale_access_token
    )
}

/// Coordinates the client-side logout side effect
pub struct LogoutCoordinator {
    store: Arc<TokenStore>,
    state: Arc<SessionState>,
    events: SessionEvents,
    http: reqwest::Client,
    backend_url: String,
    navigator: Arc<dyn Navigator>,
    in_flight: Mutex<Option<InFlight>>,
}

impl LogoutCoordinator {
    #[must_use]
    pub fn new(
        store: Arc<TokenStore>,
        state: Arc<SessionState>,
        events: SessionEvents,
        backend_url: impl Into<String>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            state,
            events,
            http: reqwest::Client::new(),
            backend_url: backend_url.into(),
            navigator,
            in_flight: Mutex::new(None),
        }
    }

    /// Run the coordinated logout, landing on the login entry point
    ///
    /// This is the path taken when a request hits the authentication-error
    /// status.
    pub async fn force_logout(&self) {
        self.force_logout_to(pages::LOGIN).await;
    }

    /// Run the coordinated logout, landing on an explicit target
    ///
    /// The channel's backend-revocation signal lands on the default route
    /// instead of the login page.
    ///
    /// Concurrent callers share one in-flight logout; the navigation target
    /// of the first caller wins.
    #[instrument(skip(self))]
    pub async fn force_logout_to(&self, target: &str) {
        let job = {
            let mut slot = self.in_flight.lock();
            if let Some(job) = slot.as_ref() {
                job.clone()
            } else {
                let job = Self::run(
                    Arc::clone(&self.store),
                    Arc::clone(&self.state),
                    self.events.clone(),
                    self.http.clone(),
                    self.backend_url.clone(),
                    Arc::clone(&self.navigator),
                    target.to_string(),
                )
                .boxed()
                .shared();
                *slot = Some(job.clone());
                job
            }
        };

        job.clone().await;

        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&job)) {
            *slot = None;
        }
    }

    /// Logout confirmation flow: act only when the token handed over via
    /// URL parameter still matches the store
    ///
    /// Returns `true` when the logout ran, `false` when the hand-off was
    /// stale (the session has already rotated) and was ignored.
    pub async fn confirm(&self, access_param: Option<&str>) -> bool {
        if !crate::handoff::verify_logout_handoff(&self.store, access_param) {
            debug!("Stale logout hand-off ignored");
            return false;
        }
        self.force_logout().await;
        true
    }

    async fn run(
        store: Arc<TokenStore>,
        state: Arc<SessionState>,
        events: SessionEvents,
        http: reqwest::Client,
        backend_url: String,
        navigator: Arc<dyn Navigator>,
        target: String,
    ) {
        // The role picks the logout endpoint; read it before clearing.
        let role = store
            .get(TokenKind::Refresh)
            .and_then(|token| decode_unverified(&token).ok())
            .map(|claims| claims.role);

        let endpoint = if role.is_some_and(Role::is_guest) {
            backend::GUEST_LOGOUT
        } else {
            backend::LOGOUT
        };

        if let Some(refresh_token) = store.get(TokenKind::Refresh) {
            let mut request = http
                .post(format!("{backend_url}{endpoint}"))
                .json(&serde_json::json!({ "refreshToken": refresh_token }));
            if let Some(access_token) = store.get(TokenKind::Access) {
                request = request.bearer_auth(access_token);
            }

            // Server-side invalidation is best effort; the local session
            // ends regardless of the call's fate.
            match request.send().await {
                Ok(response) => {
                    debug!(status = response.status().as_u16(), "Logout call settled");
                }
                Err(e) => {
                    warn!(error = %e, "Logout call failed (tolerated)");
                }
            }
        }

        store.clear();
        state.clear();
        events.emit(SessionEvent::SessionEnded(SessionEndReason::LoggedOut));
        info!(target = %target, "Session ended, navigating away");
        navigator.navigate(&target);
    }
}

impl std::fmt::Debug for LogoutCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoutCoordinator")
            .field("backend_url", &self.backend_url)
            .field("in_flight", &self.in_flight.lock().is_some())
            .finish_non_exhaustive()
    }
}
