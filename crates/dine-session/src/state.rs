//! Reactive session state
//!
//! Mirrors the authenticated role for UI gating. Updated on login, logout,
//! and whenever a refresh changes the authenticated identity.

use dine_core::Role;
use tokio::sync::watch;

/// Reactive holder of the current session role
#[derive(Debug)]
pub struct SessionState {
    tx: watch::Sender<Option<Role>>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Current role, `None` when logged out
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        *self.tx.borrow()
    }

    /// Set the role after a login or identity change
    pub fn set_role(&self, role: Role) {
        self.tx.send_replace(Some(role));
    }

    /// Clear the role on logout
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    /// Watch role changes (UI gating, channel lifecycle)
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<Role>> {
        self.tx.subscribe()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
