//! Per-connection lifecycle: register, receive loop, removal.
//!
//! Every upgraded socket runs [`on_connect`] on its own task for as long as
//! the peer stays connected. Frames are processed strictly in arrival order.

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use futures_util::{Stream, StreamExt};

use super::router::ActionRouter;
use super::socket;
use crate::app_state::AppState;
use crate::domain::{ActionEnvelope, Connection, FrameSink, InboundFrame};
use crate::error::TransportError;

/// Runs a freshly upgraded WebSocket until the peer goes away.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (sink, frames) = socket::split(socket);
    on_connect(Box::new(sink), frames, &state).await;
}

/// Registers a new connection, triggers a liveness sweep, then runs the
/// receive loop. The connection is removed from the registry as soon as
/// its loop ends.
pub async fn on_connect<S>(sink: Box<dyn FrameSink>, frames: S, state: &AppState)
where
    S: Stream<Item = Result<InboundFrame, TransportError>> + Unpin,
{
    let connection = Arc::new(Connection::new(sink));
    let id = connection.id();
    state.registry.add(Arc::clone(&connection)).await;
    let connections = state.registry.len().await;
    tracing::info!(connection_id = %id, connections, "client connected");

    // Detached; the sweep finishes on its own.
    drop(state.reaper.trigger());

    receive_loop(&connection, frames, &state.router).await;

    state.registry.remove(id).await;
    let namespace = connection.namespace().await;
    let duration_secs = (chrono::Utc::now() - connection.connected_at()).num_seconds();
    tracing::info!(
        connection_id = %id,
        namespace = %namespace,
        duration_secs,
        "client disconnected"
    );
}

/// Decodes and dispatches frames until the channel closes or errors.
///
/// A frame that is not a valid [`ActionEnvelope`] is logged and skipped.
pub async fn receive_loop<S>(connection: &Connection, mut frames: S, router: &ActionRouter)
where
    S: Stream<Item = Result<InboundFrame, TransportError>> + Unpin,
{
    while let Some(frame) = frames.next().await {
        let decoded = match frame {
            Ok(InboundFrame::Text(text)) => serde_json::from_str::<ActionEnvelope>(&text),
            Ok(InboundFrame::Binary(bytes)) => serde_json::from_slice::<ActionEnvelope>(&bytes),
            Ok(InboundFrame::Control) => continue,
            Ok(InboundFrame::Close) => break,
            Err(err) => {
                tracing::debug!(
                    connection_id = %connection.id(),
                    error = %err,
                    "receive failed"
                );
                break;
            }
        };

        match decoded {
            Ok(envelope) => router.dispatch(connection, envelope).await,
            Err(err) => {
                tracing::warn!(
                    connection_id = %connection.id(),
                    error = %err,
                    "failed to decode frame"
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use futures_util::stream;
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::ConnectionRegistry;
    use crate::domain::transport::testing::MemorySink;

    type Frame = Result<InboundFrame, TransportError>;

    fn text(value: serde_json::Value) -> Frame {
        Ok(InboundFrame::Text(value.to_string()))
    }

    fn state() -> AppState {
        AppState::new(Arc::new(ConnectionRegistry::new()))
    }

    #[tokio::test]
    async fn decode_errors_do_not_end_the_loop() {
        let state = state();
        let sink = MemorySink::new();
        let frames = stream::iter(vec![
            text(json!({"action": "add event", "data": "t"})),
            Ok(InboundFrame::Text("not json".to_string())),
            Ok(InboundFrame::Control),
            Ok(InboundFrame::Binary(br#"{"action":"ping"}"#.to_vec())),
            Ok(InboundFrame::Close),
            text(json!({"action": "id"})),
        ]);

        on_connect(Box::new(sink.clone()), frames, &state).await;

        assert_eq!(
            sink.frames(),
            vec![
                json!({"action": "add event", "data": "added"}),
                json!({"action": "ping", "data": "pong"}),
            ]
        );
        assert!(state.registry.is_empty().await);
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn connection_future_is_send() {
        let state = state();
        let frames = stream::iter(Vec::<Frame>::new());
        assert_send(&on_connect(Box::new(MemorySink::new()), frames, &state));
    }

    #[tokio::test]
    async fn transport_error_ends_the_loop() {
        let state = state();
        let sink = MemorySink::new();
        let frames = stream::iter(vec![
            Err(TransportError::Io("reset".to_string())),
            text(json!({"action": "ping"})),
        ]);

        on_connect(Box::new(sink.clone()), frames, &state).await;

        assert!(sink.frames().is_empty());
        assert!(state.registry.is_empty().await);
    }

    #[tokio::test]
    async fn connection_is_registered_while_its_loop_runs() {
        let state = state();
        let sink = MemorySink::new();
        let (tx, rx) = mpsc::unbounded_channel::<Frame>();
        let frames = Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|frame| (frame, rx))
        }));

        let task_state = state.clone();
        let task_sink = sink.clone();
        let task = tokio::spawn(async move {
            on_connect(Box::new(task_sink), frames, &task_state).await;
        });

        let Ok(()) = tx.send(text(json!({"action": "id"}))) else {
            panic!("loop hung up early");
        };
        for _ in 0..100 {
            if !sink.frames().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(state.registry.len().await, 1);
        let Some(reply) = sink.frames().pop() else {
            panic!("no id reply");
        };
        let Some(id) = reply["data"].as_str() else {
            panic!("id should be a string");
        };
        let snapshot = state.registry.snapshot().await;
        assert_eq!(snapshot.first().map(|c| c.id().to_string()), Some(id.to_string()));

        drop(tx);
        let Ok(()) = task.await else {
            panic!("connection task panicked");
        };
        assert!(state.registry.is_empty().await);
    }
}
