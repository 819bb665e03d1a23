//! Process-wide directory of live connections.
//!
//! [`ConnectionRegistry`] stores every live [`Connection`] in a `HashMap`
//! behind a single [`tokio::sync::RwLock`]. Structural changes (add,
//! remove, reap) take the write lock; broadcast and reap iteration copy a
//! snapshot of the members under the read lock and release it before any
//! network I/O, so a slow peer never blocks registration or removal.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::envelope::{EventData, EventEnvelope};
use super::subscription::TopicKey;
use super::{Connection, ConnectionId};

/// Directory of all live connections.
///
/// # Concurrency
///
/// - Add/remove are mutually exclusive with each other and with snapshots.
/// - Broadcasts iterate an owned snapshot, so a concurrent add or remove
///   never disturbs an in-flight broadcast.
/// - Removing an id that is already gone is a no-op.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    members: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a connection. Returns `false` if its id is already present.
    pub async fn add(&self, connection: Arc<Connection>) -> bool {
        let mut members = self.members.write().await;
        if members.contains_key(&connection.id()) {
            return false;
        }
        members.insert(connection.id(), connection);
        true
    }

    /// Removes a connection, returning it if it was registered.
    pub async fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.members.write().await.remove(&id)
    }

    /// Looks up a live connection by id.
    #[cfg(test)]
    pub(crate) async fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.members.read().await.get(&id).cloned()
    }

    /// Returns a consistent copy of the current membership.
    pub async fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.members.read().await.values().cloned().collect()
    }

    /// Probes every member and evicts those whose probe write fails.
    ///
    /// Probing runs on a snapshot without holding the lock; the evictions
    /// are applied afterwards in one write section. Returns the ids that
    /// were actually removed by this sweep.
    pub async fn remove_dead(&self) -> Vec<ConnectionId> {
        let mut dead = Vec::new();
        for connection in self.snapshot().await {
            if let Err(err) = connection.probe().await {
                tracing::debug!(
                    connection_id = %connection.id(),
                    error = %err,
                    "liveness probe failed"
                );
                dead.push(connection.id());
            }
        }
        if dead.is_empty() {
            return dead;
        }

        let mut members = self.members.write().await;
        dead.retain(|id| members.remove(id).is_some());
        drop(members);

        for id in &dead {
            tracing::info!(connection_id = %id, "reaped dead connection");
        }
        dead
    }

    /// Sends an [`EventEnvelope`] to every member subscribed to `topic`.
    ///
    /// The publisher is not treated specially: it receives its own event
    /// only if it is subscribed. Returns the number of subscribers a send
    /// was attempted on.
    pub async fn broadcast(
        &self,
        topic: &TopicKey,
        publisher: ConnectionId,
        action: &str,
        payload: &serde_json::Value,
    ) -> usize {
        let envelope = EventEnvelope {
            action,
            data: EventData {
                connection_id: publisher,
                event: topic.topic(),
                data: payload,
            },
        };
        let frame = match serde_json::to_string(&envelope) {
            Ok(frame) => frame,
            Err(err) => {
                tracing::warn!(topic = %topic, error = %err, "failed to encode event");
                return 0;
            }
        };

        let mut delivered = 0;
        for connection in self.snapshot().await {
            if connection.has_subscription(topic).await {
                connection.send_frame(frame.clone()).await;
                delivered += 1;
            }
        }
        tracing::debug!(topic = %topic, publisher = %publisher, delivered, "broadcast event");
        delivered
    }

    /// Returns the number of live connections.
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Returns `true` if no connection is registered.
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}
