//! Session events
//!
//! Broadcast notifications emitted by the coordinators. Subscribers hold an
//! explicit [`EventSubscription`] handle; dropping the handle releases the
//! subscription on every exit path.
//!
//! The realtime channel listens here to re-establish its connection with
//! the new token after every successful refresh.

use tokio::sync::broadcast;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    /// The refresh token itself expired (or was malformed); no renewal can
    /// succeed, detected locally by claim inspection
    RefreshTokenExpired,
    /// A coordinated logout ran (user action, auth failure, or a backend
    /// revocation signal)
    LoggedOut,
}

/// Events observable by collaborators of the session core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A new token pair was written to the store
    TokensRefreshed,
    /// The session is over and the store has been cleared
    SessionEnded(SessionEndReason),
}

/// Broadcast hub for session events
#[derive(Debug, Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

/// Buffer depth; session events are rare, lag means a subscriber is stuck
const EVENT_BUFFER_SIZE: usize = 16;

impl SessionEvents {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Emit an event to all current subscribers
    ///
    /// Emitting with no subscribers is not an error.
    pub fn emit(&self, event: SessionEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(event = ?event, "Session event emitted with no subscribers");
        }
    }

    /// Subscribe to session events
    #[must_use]
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription handle over the session event stream
#[derive(Debug)]
pub struct EventSubscription {
    rx: broadcast::Receiver<SessionEvent>,
}

impl EventSubscription {
    /// Wait for the next event
    ///
    /// Returns `None` once the event hub is gone. A lagged subscriber skips
    /// to the oldest retained event rather than erroring out.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
