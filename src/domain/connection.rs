//! A single live client session.
//!
//! A [`Connection`] owns the outbound half of its channel, its identity and
//! its [`SubscriptionSet`]. Only the connection's own receive loop mutates
//! the subscriptions; any broadcasting task may read them and call
//! [`Connection::send`] concurrently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use super::ConnectionId;
use super::subscription::{SubscriptionSet, TopicKey};
use super::transport::FrameSink;
use crate::error::{HubError, TransportError};

/// One logical client session bound to a single transport channel.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    connected_at: DateTime<Utc>,
    subscriptions: RwLock<SubscriptionSet>,
    sink: Box<dyn FrameSink>,
}

impl Connection {
    /// Wraps a freshly upgraded channel in a new session with a random id.
    #[must_use]
    pub fn new(sink: Box<dyn FrameSink>) -> Self {
        Self {
            id: ConnectionId::new(),
            connected_at: Utc::now(),
            subscriptions: RwLock::new(SubscriptionSet::new()),
            sink,
        }
    }

    /// Session identity.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// When the transport upgrade completed.
    #[must_use]
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Current namespace (empty string until the client sets one).
    pub async fn namespace(&self) -> String {
        self.subscriptions.read().await.namespace().to_string()
    }

    /// Sets the namespace for later subscribe, unsubscribe and publish
    /// actions. Subscriptions made earlier keep their namespace.
    pub async fn set_namespace(&self, namespace: &str) {
        self.subscriptions.write().await.set_namespace(namespace);
    }

    /// Qualifies `topic` with this connection's current namespace.
    pub async fn topic_key(&self, topic: &str) -> TopicKey {
        self.subscriptions.read().await.key_for(topic)
    }

    /// Subscribes to `topic`. Idempotent; returns `false` if already
    /// subscribed.
    pub async fn add_subscription(&self, topic: &str) -> bool {
        self.subscriptions.write().await.subscribe(topic)
    }

    /// Unsubscribes from `topic`. Returns `false` if it was not subscribed.
    pub async fn remove_subscription(&self, topic: &str) -> bool {
        self.subscriptions.write().await.unsubscribe(topic)
    }

    /// Returns `true` if this connection listens to `key`.
    pub async fn has_subscription(&self, key: &TopicKey) -> bool {
        self.subscriptions.read().await.matches(key)
    }

    /// Subscribed topic names in subscription order.
    pub async fn subscriptions(&self) -> Vec<String> {
        self.subscriptions
            .read()
            .await
            .topics()
            .map(str::to_owned)
            .collect()
    }

    /// Encodes `payload` as JSON and writes it as one frame.
    ///
    /// Best effort: encode and write failures are logged and swallowed so
    /// that a broken subscriber never fails its publisher.
    pub async fn send<T: Serialize + ?Sized>(&self, payload: &T) {
        if let Err(err) = self.try_send(payload).await {
            tracing::warn!(connection_id = %self.id, error = %err, "failed to send message");
        }
    }

    /// Writes an already encoded frame. Failures are logged and swallowed.
    pub async fn send_frame(&self, frame: String) {
        if let Err(err) = self.sink.send_text(frame).await {
            tracing::warn!(connection_id = %self.id, error = %err, "failed to send message");
        }
    }

    /// Encodes and writes `payload`, reporting failures to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Encode`] if `payload` cannot be serialized and
    /// [`HubError::Transport`] if the frame could not be written.
    pub async fn try_send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), HubError> {
        let frame = serde_json::to_string(payload)?;
        self.sink.send_text(frame).await?;
        Ok(())
    }

    /// Writes a zero-payload liveness probe.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the peer is gone.
    pub async fn probe(&self) -> Result<(), TransportError> {
        self.sink.probe().await
    }
}
