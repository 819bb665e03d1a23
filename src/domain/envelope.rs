//! Wire envelopes exchanged over a client channel.
//!
//! Requests and responses share one shape:
//!
//! ```json
//! { "action": "add event", "data": "prices" }
//! ```
//!
//! Topic broadcasts wrap the publisher's payload:
//!
//! ```json
//! {
//!   "action": "send to event",
//!   "data": { "connection_id": "<uuid>", "event": "prices", "data": { "bid": 1 } }
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::ConnectionId;

/// Request or response unit: a discriminator plus a polymorphic payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// Action discriminator, matched case-insensitively on input.
    pub action: String,
    /// Action-specific payload; `null` when absent.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ActionEnvelope {
    /// Builds a response envelope echoing `action`.
    #[must_use]
    pub fn new(action: impl Into<String>, data: impl Into<serde_json::Value>) -> Self {
        Self {
            action: action.into(),
            data: data.into(),
        }
    }
}

/// Broadcast notification delivered to every subscriber of a topic.
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope<'a> {
    /// Discriminator of the publishing action.
    pub action: &'a str,
    /// Publisher, topic and payload.
    pub data: EventData<'a>,
}

/// Body of an [`EventEnvelope`].
#[derive(Debug, Clone, Serialize)]
pub struct EventData<'a> {
    /// Connection that published the event.
    pub connection_id: ConnectionId,
    /// Bare topic name.
    pub event: &'a str,
    /// Arbitrary publisher payload.
    pub data: &'a serde_json::Value,
}
