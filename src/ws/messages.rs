//! Typed client actions decoded from an [`ActionEnvelope`].
//!
//! Decoding happens in two steps: the envelope is parsed generically, then
//! [`Action::parse`] checks the `data` shape the discriminator requires.
//!
//! [`ActionEnvelope`]: crate::domain::ActionEnvelope

use serde::Deserialize;

use crate::error::ActionError;

/// Action discriminators understood by the router (lower case).
pub mod names {
    /// Ask for the connection id.
    pub const ID: &str = "id";
    /// Keep-alive round trip.
    pub const PING: &str = "ping";
    /// Set the namespace.
    pub const APPLICATION: &str = "application";
    /// Subscribe to a topic.
    pub const ADD_EVENT: &str = "add event";
    /// Unsubscribe from a topic.
    pub const REMOVE_EVENT: &str = "remove event";
    /// List subscriptions.
    pub const EVENTS: &str = "events";
    /// Publish to a topic.
    pub const SEND_TO_EVENT: &str = "send to event";
}

/// A client request with its payload checked against the expected shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Reply with the connection id.
    Id,
    /// Reply with `"pong"`.
    Ping,
    /// Set the connection namespace.
    Application(String),
    /// Subscribe to a topic.
    AddEvent(String),
    /// Unsubscribe from a topic.
    RemoveEvent(String),
    /// Reply with the subscribed topics.
    Events,
    /// Publish `data` to every subscriber of `event`.
    SendToEvent {
        /// Topic name.
        event: String,
        /// Arbitrary payload.
        data: serde_json::Value,
    },
}

#[derive(Debug, Deserialize)]
struct SendToEventData {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl Action {
    /// Matches `action` case-insensitively and decodes `data` for it.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::UnknownAction`] for an unrecognized
    /// discriminator and [`ActionError::InvalidData`] when `data` does not
    /// have the shape the action requires. Both carry `action` verbatim.
    pub fn parse(action: &str, data: serde_json::Value) -> Result<Self, ActionError> {
        let invalid = || ActionError::InvalidData {
            action: action.to_string(),
        };

        match action.to_lowercase().as_str() {
            names::ID => Ok(Self::Id),
            names::PING => Ok(Self::Ping),
            names::EVENTS => Ok(Self::Events),
            names::APPLICATION => string_data(data).map(Self::Application).ok_or_else(invalid),
            names::ADD_EVENT => string_data(data).map(Self::AddEvent).ok_or_else(invalid),
            names::REMOVE_EVENT => string_data(data).map(Self::RemoveEvent).ok_or_else(invalid),
            names::SEND_TO_EVENT => {
                let body: SendToEventData = serde_json::from_value(data).map_err(|_| invalid())?;
                Ok(Self::SendToEvent {
                    event: body.event,
                    data: body.data,
                })
            }
            _ => Err(ActionError::UnknownAction {
                action: action.to_string(),
            }),
        }
    }

    /// Canonical lower-case discriminator.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Id => names::ID,
            Self::Ping => names::PING,
            Self::Application(_) => names::APPLICATION,
            Self::AddEvent(_) => names::ADD_EVENT,
            Self::RemoveEvent(_) => names::REMOVE_EVENT,
            Self::Events => names::EVENTS,
            Self::SendToEvent { .. } => names::SEND_TO_EVENT,
        }
    }
}

fn string_data(data: serde_json::Value) -> Option<String> {
    match data {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}
