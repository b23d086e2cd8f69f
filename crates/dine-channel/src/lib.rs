//! # dine-channel
//!
//! The realtime session channel: a persistent, auto-reconnecting websocket
//! client authenticated with the current access token. Carries the
//! out-of-band session signals (`refresh-token`, `logout`) that can arrive
//! asynchronously relative to the refresh scheduler, plus the domain events
//! (`update-order`, `payment`) forwarded to subscribers.

pub mod backoff;
pub mod channel;
pub mod protocol;

// Re-export commonly used types at crate root
pub use backoff::Backoff;
pub use channel::{ChannelSubscription, SessionChannel};
pub use protocol::{ChannelEvent, ChannelMessage};
