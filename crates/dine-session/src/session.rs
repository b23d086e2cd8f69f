//! Session aggregate
//!
//! One explicitly owned object with process-wide lifetime holding the token
//! store, the reactive state, the event hub, and both coordinators. It is
//! constructed once at application start and passed around by `Arc`; tests
//! build fresh instances so the in-flight markers reset between cases.

use std::sync::Arc;
use std::time::Duration;

use dine_core::ExecutionContext;
use tracing::info;

use crate::events::SessionEvents;
use crate::logout::LogoutCoordinator;
use crate::refresh::RefreshCoordinator;
use crate::scheduler::{RefreshScheduler, SchedulerGate};
use crate::state::SessionState;
use crate::store::{StorageBackend, TokenStore};

/// Hard-navigation seam
///
/// The session core decides *where* to go (login entry point, default
/// route); the surrounding application decides *how* navigation happens.
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Default navigator: records the intent in the log only
///
/// Useful for headless runs; the real application installs its own.
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, location: &str) {
        info!(location = %location, "Navigation requested");
    }
}

/// The session core, fully wired
pub struct Session {
    context: ExecutionContext,
    store: Arc<TokenStore>,
    state: Arc<SessionState>,
    events: SessionEvents,
    refresh: Arc<RefreshCoordinator>,
    logout: Arc<LogoutCoordinator>,
}

impl Session {
    /// Start building a session
    #[must_use]
    pub fn builder(backend_url: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            backend_url: backend_url.into(),
            context: ExecutionContext::Client,
            navigator: None,
            storage: None,
        }
    }

    #[must_use]
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    #[must_use]
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    #[must_use]
    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    #[must_use]
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    #[must_use]
    pub fn refresh(&self) -> &Arc<RefreshCoordinator> {
        &self.refresh
    }

    #[must_use]
    pub fn logout(&self) -> &Arc<LogoutCoordinator> {
        &self.logout
    }

    /// Spawn the refresh scheduler for this session
    #[must_use]
    pub fn spawn_scheduler(&self, cadence: Duration, gate: SchedulerGate) -> RefreshScheduler {
        RefreshScheduler::spawn(Arc::clone(&self.refresh), cadence, gate)
    }

    /// Refresh confirmation flow: force a renewal only when the refresh
    /// token handed over via URL parameter still matches the store
    ///
    /// Returns `None` when the hand-off was stale and was ignored.
    pub async fn confirm_refresh(
        &self,
        refresh_param: Option<&str>,
    ) -> Option<crate::refresh::RefreshOutcome> {
        if !crate::handoff::verify_refresh_handoff(&self.store, refresh_param) {
            tracing::debug!("Stale refresh hand-off ignored");
            return None;
        }
        Some(self.refresh.check_and_refresh(true).await)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("context", &self.context)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Session`]
pub struct SessionBuilder {
    backend_url: String,
    context: ExecutionContext,
    navigator: Option<Arc<dyn Navigator>>,
    storage: Option<Box<dyn StorageBackend>>,
}

impl SessionBuilder {
    /// Set the execution context (defaults to `Client`)
    #[must_use]
    pub fn context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Install a navigator (defaults to [`TracingNavigator`])
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Install a storage backend (defaults to the in-memory backend)
    #[must_use]
    pub fn storage(mut self, storage: Box<dyn StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Wire everything together
    #[must_use]
    pub fn build(self) -> Arc<Session> {
        let store = Arc::new(match self.storage {
            Some(backend) => TokenStore::with_backend(self.context, backend),
            None => TokenStore::new(self.context),
        });
        let state = Arc::new(SessionState::new());
        let events = SessionEvents::new();
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(TracingNavigator));

        let refresh = Arc::new(RefreshCoordinator::new(
            Arc::clone(&store),
            events.clone(),
            self.backend_url.clone(),
        ));
        let logout = Arc::new(LogoutCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&state),
            events.clone(),
            self.backend_url,
            navigator,
        ));

        Arc::new(Session {
            context: self.context,
            store,
            state,
            events,
            refresh,
            logout,
        })
    }
}
