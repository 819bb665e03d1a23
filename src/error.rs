//! Hub error types.
//!
//! Nothing in here ever escapes a connection boundary: transport errors
//! end one session, [`ActionError`]s are echoed back to the client that
//! caused them, and encode failures are logged and the message dropped.

/// Failure of the underlying duplex channel for a single connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the channel or it was already torn down.
    #[error("channel closed")]
    Closed,

    /// Receive, send or probe failed at the socket level.
    #[error("transport i/o: {0}")]
    Io(String),
}

impl From<axum::Error> for TransportError {
    fn from(err: axum::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Recoverable error raised while interpreting an inbound action.
///
/// The `Display` text is exactly what the offending client receives as the
/// `data` of its response envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// `data` did not have the shape the action requires.
    #[error("Invalid data type for {action}")]
    InvalidData {
        /// Discriminator as sent by the client.
        action: String,
    },

    /// Discriminator did not match any known action.
    #[error("Unknown action: {action}")]
    UnknownAction {
        /// Discriminator as sent by the client.
        action: String,
    },
}

/// Top-level hub error.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Invalid startup configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Outbound payload could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Channel-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
