//! Transport boundary between the hub core and the duplex socket.
//!
//! The core only needs two things from a channel: write one whole text
//! frame, and write a zero-payload liveness probe. Inbound traffic reaches
//! the core as a stream of [`InboundFrame`]s.

use async_trait::async_trait;

use crate::error::TransportError;

/// Outbound half of a client channel.
///
/// Implementations must make each call write exactly one complete frame,
/// even when called concurrently from several broadcasting tasks.
#[async_trait]
pub trait FrameSink: Send + Sync + std::fmt::Debug {
    /// Writes one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the frame could not be written.
    async fn send_text(&self, frame: String) -> Result<(), TransportError>;

    /// Writes a zero-payload liveness probe.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the peer is gone.
    async fn probe(&self) -> Result<(), TransportError>;
}

/// One frame read from a client channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame; decoded the same way as text.
    Binary(Vec<u8>),
    /// Peer-initiated close.
    Close,
    /// Ping/pong and other control frames handled by the transport.
    Control,
}
