//! Adapts an axum [`WebSocket`] to the hub's transport boundary.

use std::fmt;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::Mutex;

use crate::domain::{FrameSink, InboundFrame};
use crate::error::TransportError;

/// Write half of a WebSocket. The mutex keeps concurrent writers from
/// interleaving partial frames.
pub struct WsSink {
    inner: Mutex<SplitSink<WebSocket, Message>>,
}

impl fmt::Debug for WsSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&self, frame: String) -> Result<(), TransportError> {
        self.inner
            .lock()
            .await
            .send(Message::text(frame))
            .await
            .map_err(TransportError::from)
    }

    async fn probe(&self) -> Result<(), TransportError> {
        self.inner
            .lock()
            .await
            .send(Message::Ping(Bytes::new()))
            .await
            .map_err(TransportError::from)
    }
}

/// Splits an upgraded socket into the hub's sink and inbound frame stream.
pub fn split(
    socket: WebSocket,
) -> (
    WsSink,
    impl Stream<Item = Result<InboundFrame, TransportError>> + Send + Unpin,
) {
    let (tx, rx) = socket.split();
    let frames = rx.map(|msg| msg.map(inbound_frame).map_err(TransportError::from));
    (
        WsSink {
            inner: Mutex::new(tx),
        },
        frames,
    )
}

fn inbound_frame(msg: Message) -> InboundFrame {
    match msg {
        Message::Text(text) => InboundFrame::Text(text.as_str().to_owned()),
        Message::Binary(bytes) => InboundFrame::Binary(bytes.to_vec()),
        Message::Close(_) => InboundFrame::Close,
        Message::Ping(_) | Message::Pong(_) => InboundFrame::Control,
    }
}
