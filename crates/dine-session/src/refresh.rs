//! Refresh coordinator
//!
//! Decides whether to renew the token pair before the access token lapses
//! and performs the renewal against the refresh endpoint of the session's
//! identity domain (staff and guest sessions refresh against distinct
//! endpoints).
//!
//! At most one refresh request may be in flight at any time: the backend
//! rotates the refresh token on every renewal, so two concurrent rotations
//! would invalidate each other. The interval scheduler and the realtime
//! channel's force-refresh signal both funnel through
//! [`RefreshCoordinator::check_and_refresh`], so concurrent callers await
//! the same in-flight result instead of issuing a duplicate request.

use std::sync::Arc;

use chrono::Utc;
use dine_common::{decode_unverified, endpoints::backend, Claims, TokenPair};
use dine_core::TokenKind;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::events::{SessionEndReason, SessionEvent, SessionEvents};
use crate::store::TokenStore;

/// Safety margin against boundary races when judging refresh-token expiry
const REFRESH_EXPIRY_MARGIN_SECS: i64 = 1;

/// Transient refresh failure; the stored pair is left untouched because it
/// may still be valid for the remaining window
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("Refresh request failed: {0}")]
    Transport(String),

    #[error("Refresh rejected with status {status}")]
    Rejected { status: u16 },
}

/// Result of one pass through the refresh decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new pair was obtained and written to the store
    Renewed,
    /// Renewal threshold not reached, nothing done
    StillFresh,
    /// No complete pair in the store, nothing to refresh
    NoSession,
    /// The refresh token is past its own expiry (or malformed): the store
    /// was cleared and no further attempt can succeed
    SessionExpired,
    /// Transient failure; the store is untouched and the next tick retries
    Failed(RefreshError),
}

impl RefreshOutcome {
    /// Terminal outcomes stop the refresh scheduler
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

/// Renew once two-thirds of the access token's lifetime has elapsed
///
/// Refreshing ahead of outright expiry absorbs network latency and avoids a
/// visibly failed request mid-renewal.
#[must_use]
pub fn renewal_due(access: &Claims, now: i64) -> bool {
    access.remaining(now) < access.window() / 3
}

/// A refresh token past its own expiry cannot mint a new access token
#[must_use]
pub fn refresh_expired(refresh: &Claims, now: i64) -> bool {
    refresh.exp <= now + REFRESH_EXPIRY_MARGIN_SECS
}

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Coordinates proactive token renewal
///
/// Owns the refresh-in-flight marker; constructing a fresh coordinator (as
/// tests do through `Session::builder`) resets it.
pub struct RefreshCoordinator {
    store: Arc<TokenStore>,
    events: SessionEvents,
    http: reqwest::Client,
    backend_url: String,
    in_flight: Mutex<Option<InFlight>>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(store: Arc<TokenStore>, events: SessionEvents, backend_url: impl Into<String>) -> Self {
        Self {
            store,
            events,
            http: reqwest::Client::new(),
            backend_url: backend_url.into(),
            in_flight: Mutex::new(None),
        }
    }

    /// Check the stored pair and renew it if warranted
    ///
    /// `force` skips the renewal threshold (used by the channel's
    /// force-refresh signal and the refresh confirmation flow) but never
    /// overrides the terminal refresh-expiry check.
    ///
    /// A call arriving while another is in flight awaits the same result;
    /// exactly one network request is issued.
    #[instrument(skip(self))]
    pub async fn check_and_refresh(&self, force: bool) -> RefreshOutcome {
        let job = {
            let mut slot = self.in_flight.lock();
            if let Some(job) = slot.as_ref() {
                job.clone()
            } else {
                let job = Self::run(
                    Arc::clone(&self.store),
                    self.events.clone(),
                    self.http.clone(),
                    self.backend_url.clone(),
                    force,
                )
                .boxed()
                .shared();
                *slot = Some(job.clone());
                job
            }
        };

        let outcome = job.clone().await;

        // Release the marker unconditionally once the attempt settles, but
        // only if a newer attempt has not replaced it in the meantime.
        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&job)) {
            *slot = None;
        }

        outcome
    }

    async fn run(
        store: Arc<TokenStore>,
        events: SessionEvents,
        http: reqwest::Client,
        backend_url: String,
        force: bool,
    ) -> RefreshOutcome {
        // Re-read the store on every invocation; another actor may have
        // mutated it since the previous callback turn.
        let (Some(access_raw), Some(refresh_raw)) =
            (store.get(TokenKind::Access), store.get(TokenKind::Refresh))
        else {
            return RefreshOutcome::NoSession;
        };

        let now = Utc::now().timestamp();

        let refresh_claims = match decode_unverified(&refresh_raw) {
            Ok(claims) => claims,
            Err(_) => {
                warn!("Malformed refresh token; ending session");
                return Self::end_session(&store, &events);
            }
        };

        if refresh_expired(&refresh_claims, now) {
            info!("Refresh token expired; ending session");
            return Self::end_session(&store, &events);
        }

        let access_claims = match decode_unverified(&access_raw) {
            Ok(claims) => claims,
            Err(_) => {
                warn!("Malformed access token; ending session");
                return Self::end_session(&store, &events);
            }
        };

        if !force && !renewal_due(&access_claims, now) {
            return RefreshOutcome::StillFresh;
        }

        // Distinct identity domains refresh against distinct endpoints.
        let endpoint = if refresh_claims.role.is_guest() {
            backend::GUEST_REFRESH_TOKEN
        } else {
            backend::REFRESH_TOKEN
        };

        let response = http
            .post(format!("{backend_url}{endpoint}"))
            .json(&serde_json::json!({ "refreshToken": refresh_raw }))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Refresh request failed; keeping current pair");
                return RefreshOutcome::Failed(RefreshError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Refresh rejected; keeping current pair");
            return RefreshOutcome::Failed(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }

        let payload: RefreshResponse = match response.json().await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Refresh response unreadable; keeping current pair");
                return RefreshOutcome::Failed(RefreshError::Transport(e.to_string()));
            }
        };

        store.set_pair(&payload.data);
        events.emit(SessionEvent::TokensRefreshed);
        info!(role = %refresh_claims.role, "Token pair renewed");

        RefreshOutcome::Renewed
    }

    fn end_session(store: &TokenStore, events: &SessionEvents) -> RefreshOutcome {
        store.clear();
        events.emit(SessionEvent::SessionEnded(
            SessionEndReason::RefreshTokenExpired,
        ));
        RefreshOutcome::SessionExpired
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("backend_url", &self.backend_url)
            .field("in_flight", &self.in_flight.lock().is_some())
            .finish_non_exhaustive()
    }
}

/// Refresh endpoint payload
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    data: TokenPair,
}
