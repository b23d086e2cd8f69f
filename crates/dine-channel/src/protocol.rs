//! Channel wire format
//!
//! Inbound messages are JSON objects tagged by an `event` field, with an
//! optional `data` payload for domain events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound message from the backend's session channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ChannelMessage {
    /// Force an immediate token refresh, regardless of the renewal
    /// threshold
    RefreshToken,
    /// The backend unilaterally invalidated this session (e.g. an admin
    /// revoked the employee)
    Logout,
    /// An order changed state
    UpdateOrder(Value),
    /// A payment settled
    Payment(Value),
}

impl ChannelMessage {
    /// Serialize to the wire representation
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from the wire representation
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Event surfaced to channel subscribers
///
/// Connection transitions are observational only; no session state changes
/// on their account.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    OrderUpdated(Value),
    PaymentReceived(Value),
}
