//! Execution context flag
//!
//! The session core runs in two environments: the browser-side application
//! (full access to persistent storage and navigation) and the server-side
//! rendering layer (no browser storage; side effects become redirect
//! directives instead).

use serde::{Deserialize, Serialize};

/// Where the current code is executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Browser-side application
    #[default]
    Client,
    /// Server-side rendering / routing layer
    Server,
}

impl ExecutionContext {
    #[must_use]
    pub fn is_client(self) -> bool {
        matches!(self, Self::Client)
    }

    #[must_use]
    pub fn is_server(self) -> bool {
        matches!(self, Self::Server)
    }
}
