//! # dine-session
//!
//! The session core: durable token storage, reactive session state, the
//! refresh coordinator with single-flight deduplication, the coordinated
//! logout side effect, and the interval scheduler that drives proactive
//! renewal.
//!
//! The token store and the http-only cookie pair managed by the edge layer
//! are two copies of the same credential that may temporarily disagree;
//! they are reconciled only at the explicit hand-off points in [`handoff`].

pub mod events;
pub mod handoff;
pub mod logout;
pub mod refresh;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod store;

// Re-export commonly used types at crate root
pub use events::{EventSubscription, SessionEndReason, SessionEvent, SessionEvents};
pub use logout::{logout_redirect, LogoutCoordinator};
pub use refresh::{RefreshCoordinator, RefreshError, RefreshOutcome};
pub use scheduler::{RefreshScheduler, SchedulerGate};
pub use session::{Navigator, Session, SessionBuilder, TracingNavigator};
pub use state::SessionState;
pub use store::{MemoryBackend, StorageBackend, TokenStore};
