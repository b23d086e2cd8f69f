//! Token storage
//!
//! Durable client-side storage of the access/refresh pair and the single
//! source of truth for "is logged in" on the client. Storage is keyed by
//! the fixed names `accessToken`/`refreshToken` behind a pluggable backend
//! (the default in-memory backend stands in for origin-scoped persistent
//! browser storage).
//!
//! Three independent actors touch this store (request executor, refresh
//! coordinator, channel logout handler). Each must re-read at the start of
//! every invocation rather than caching tokens across callback turns.

use std::collections::HashMap;

use dine_common::TokenPair;
use dine_core::{ExecutionContext, TokenKind};
use parking_lot::RwLock;

/// Key/value storage behind the token store
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        self.entries.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }
}

/// Client-side token store
///
/// Every operation is infallible. In a server execution context there is no
/// browser storage to touch, so reads return `None` and writes are no-ops
/// instead of failing.
pub struct TokenStore {
    context: ExecutionContext,
    backend: Box<dyn StorageBackend>,
}

impl TokenStore {
    /// Create a store with the default in-memory backend
    #[must_use]
    pub fn new(context: ExecutionContext) -> Self {
        Self::with_backend(context, Box::new(MemoryBackend::default()))
    }

    /// Create a store over a custom storage backend
    #[must_use]
    pub fn with_backend(context: ExecutionContext, backend: Box<dyn StorageBackend>) -> Self {
        Self { context, backend }
    }

    /// Read one member of the token pair
    #[must_use]
    pub fn get(&self, kind: TokenKind) -> Option<String> {
        if self.context.is_server() {
            return None;
        }
        self.backend.read(kind.storage_key())
    }

    /// Write one member of the token pair
    pub fn set(&self, kind: TokenKind, value: &str) {
        if self.context.is_server() {
            return;
        }
        self.backend.write(kind.storage_key(), value);
        tracing::debug!(kind = ?kind, "Stored token");
    }

    /// Write both members of a freshly issued pair
    pub fn set_pair(&self, pair: &TokenPair) {
        self.set(TokenKind::Access, &pair.access_token);
        self.set(TokenKind::Refresh, &pair.refresh_token);
    }

    /// Remove both tokens
    pub fn clear(&self) {
        if self.context.is_server() {
            return;
        }
        self.backend.remove(TokenKind::Access.storage_key());
        self.backend.remove(TokenKind::Refresh.storage_key());
        tracing::debug!("Cleared token store");
    }

    /// Both tokens, when a complete pair is present
    #[must_use]
    pub fn pair(&self) -> Option<TokenPair> {
        let access_token = self.get(TokenKind::Access)?;
        let refresh_token = self.get(TokenKind::Refresh)?;
        Some(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Absence of either token implies "logged out"
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.pair().is_some()
    }

    /// Execution context this store was built for
    #[must_use]
    pub fn context(&self) -> ExecutionContext {
        self.context
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("context", &self.context)
            .field("logged_in", &self.is_logged_in())
            .finish_non_exhaustive()
    }
}
