//! Edge state
//!
//! Shared dependencies for the edge server's handlers.

use std::sync::Arc;

use dine_client::ApiClient;
use dine_common::AppConfig;
use dine_core::ExecutionContext;
use dine_session::Session;

/// Edge application state
#[derive(Clone)]
pub struct EdgeState {
    /// Request executor bound to a server-context session (no browser
    /// storage behind it; auth failures surface as redirect directives)
    client: ApiClient,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl EdgeState {
    /// Wire the edge state from configuration
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let session = Session::builder(config.backend.url.clone())
            .context(ExecutionContext::Server)
            .build();
        let client = ApiClient::new(session, config.backend.url.clone(), config.edge.origin());

        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Get the request executor
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Get the application configuration
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for EdgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeState")
            .field("backend_url", &self.config.backend.url)
            .finish_non_exhaustive()
    }
}
