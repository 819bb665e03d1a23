//! Action router: interprets one inbound envelope for one connection.
//!
//! The router itself is stateless; every mutation lands on the requesting
//! [`Connection`] or goes out through [`ConnectionRegistry::broadcast`].
//! Every reply, including errors, is an [`ActionEnvelope`] echoing the
//! discriminator the client sent.

use std::sync::Arc;

use super::messages::Action;
use crate::domain::{ActionEnvelope, Connection, ConnectionRegistry};

/// Dispatches decoded client actions.
#[derive(Debug, Clone)]
pub struct ActionRouter {
    registry: Arc<ConnectionRegistry>,
}

impl ActionRouter {
    /// Creates a router publishing through `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Handles `envelope` on behalf of `connection` and sends the reply.
    ///
    /// Shape mismatches and unknown actions are answered with an error
    /// string on the same connection; they never end the session.
    pub async fn dispatch(&self, connection: &Connection, envelope: ActionEnvelope) {
        let ActionEnvelope { action: name, data } = envelope;

        let action = match Action::parse(&name, data) {
            Ok(action) => action,
            Err(err) => {
                tracing::warn!(
                    connection_id = %connection.id(),
                    action = %name,
                    error = %err,
                    "rejected action"
                );
                connection
                    .send(&ActionEnvelope::new(name, err.to_string()))
                    .await;
                return;
            }
        };

        tracing::debug!(
            connection_id = %connection.id(),
            action = action.name(),
            "dispatching action"
        );
        if let Some(reply) = self.execute(connection, &name, action).await {
            connection.send(&ActionEnvelope::new(name, reply)).await;
        }
    }

    /// Runs `action` and returns the reply payload, if the action has one.
    async fn execute(
        &self,
        connection: &Connection,
        name: &str,
        action: Action,
    ) -> Option<serde_json::Value> {
        match action {
            Action::Id => Some(connection.id().to_string().into()),
            Action::Ping => Some("pong".into()),
            Action::Application(namespace) => {
                connection.set_namespace(&namespace).await;
                tracing::info!(
                    connection_id = %connection.id(),
                    namespace = %namespace,
                    "namespace set"
                );
                Some(format!("Application name set to {namespace}").into())
            }
            Action::AddEvent(topic) => {
                connection.add_subscription(&topic).await;
                Some("added".into())
            }
            Action::RemoveEvent(topic) => {
                connection.remove_subscription(&topic).await;
                Some("removed".into())
            }
            Action::Events => Some(connection.subscriptions().await.into()),
            Action::SendToEvent { event, data } => {
                let key = connection.topic_key(&event).await;
                self.registry
                    .broadcast(&key, connection.id(), name, &data)
                    .await;
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::transport::testing::MemorySink;

    struct Fixture {
        registry: Arc<ConnectionRegistry>,
        router: ActionRouter,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(ConnectionRegistry::new());
            let router = ActionRouter::new(Arc::clone(&registry));
            Self { registry, router }
        }

        async fn connect(&self) -> (Arc<Connection>, MemorySink) {
            let sink = MemorySink::new();
            let conn = Arc::new(Connection::new(Box::new(sink.clone())));
            self.registry.add(Arc::clone(&conn)).await;
            (conn, sink)
        }

        async fn send(&self, conn: &Connection, action: &str, data: Value) {
            self.router
                .dispatch(conn, ActionEnvelope::new(action, data))
                .await;
        }
    }

    fn last(sink: &MemorySink) -> Value {
        let Some(frame) = sink.frames().pop() else {
            panic!("no frame sent");
        };
        frame
    }

    #[tokio::test]
    async fn id_returns_connection_id() {
        let fx = Fixture::new();
        let (conn, sink) = fx.connect().await;
        fx.send(&conn, "id", Value::Null).await;
        assert_eq!(last(&sink), json!({"action": "id", "data": conn.id().to_string()}));
    }

    #[tokio::test]
    async fn ping_always_pongs() {
        let fx = Fixture::new();
        let (conn, sink) = fx.connect().await;
        for data in [Value::Null, json!("x"), json!({"a": [1]})] {
            fx.send(&conn, "ping", data).await;
            assert_eq!(last(&sink), json!({"action": "ping", "data": "pong"}));
        }
    }

    #[tokio::test]
    async fn reply_echoes_client_spelling() {
        let fx = Fixture::new();
        let (conn, sink) = fx.connect().await;
        fx.send(&conn, "PING", Value::Null).await;
        assert_eq!(last(&sink), json!({"action": "PING", "data": "pong"}));
    }

    #[tokio::test]
    async fn application_sets_namespace() {
        let fx = Fixture::new();
        let (conn, sink) = fx.connect().await;
        fx.send(&conn, "application", json!("chat")).await;

        assert_eq!(conn.namespace().await, "chat");
        let reply = last(&sink);
        assert_eq!(reply["action"], "application");
        let Some(text) = reply["data"].as_str() else {
            panic!("expected string reply");
        };
        assert!(text.contains("chat"));
    }

    #[tokio::test]
    async fn add_remove_and_list_events() {
        let fx = Fixture::new();
        let (conn, sink) = fx.connect().await;

        fx.send(&conn, "add event", json!("b")).await;
        assert_eq!(last(&sink), json!({"action": "add event", "data": "added"}));
        fx.send(&conn, "add event", json!("a")).await;
        fx.send(&conn, "add event", json!("b")).await;

        fx.send(&conn, "events", Value::Null).await;
        assert_eq!(last(&sink), json!({"action": "events", "data": ["b", "a"]}));

        fx.send(&conn, "remove event", json!("b")).await;
        assert_eq!(last(&sink), json!({"action": "remove event", "data": "removed"}));
        fx.send(&conn, "remove event", json!("missing")).await;
        assert_eq!(last(&sink), json!({"action": "remove event", "data": "removed"}));

        fx.send(&conn, "events", Value::Null).await;
        assert_eq!(last(&sink), json!({"action": "events", "data": ["a"]}));
    }

    #[tokio::test]
    async fn send_to_event_fans_out_without_direct_reply() {
        let fx = Fixture::new();
        let (publisher, publisher_sink) = fx.connect().await;
        let (listener, listener_sink) = fx.connect().await;
        let (_, idle_sink) = fx.connect().await;
        fx.send(&listener, "add event", json!("t")).await;
        let before = listener_sink.frames().len();

        fx.send(&publisher, "send to event", json!({"event": "t", "data": {"v": 7}}))
            .await;

        assert!(publisher_sink.frames().is_empty());
        assert!(idle_sink.frames().is_empty());
        assert_eq!(listener_sink.frames().len(), before + 1);
        assert_eq!(
            last(&listener_sink),
            json!({
                "action": "send to event",
                "data": {
                    "connection_id": publisher.id().to_string(),
                    "event": "t",
                    "data": {"v": 7}
                }
            })
        );
    }

    #[tokio::test]
    async fn send_to_event_stays_in_namespace() {
        let fx = Fixture::new();
        let (a, a_sink) = fx.connect().await;
        let (b, _) = fx.connect().await;
        fx.send(&a, "application", json!("A")).await;
        fx.send(&a, "add event", json!("x")).await;
        fx.send(&b, "application", json!("B")).await;
        let before = a_sink.frames().len();

        fx.send(&b, "send to event", json!({"event": "x", "data": 1}))
            .await;
        assert_eq!(a_sink.frames().len(), before);
    }

    #[tokio::test]
    async fn subscription_stays_in_namespace_it_was_made_in() {
        let fx = Fixture::new();
        let (listener, listener_sink) = fx.connect().await;
        let (default_publisher, _) = fx.connect().await;
        let (app_publisher, _) = fx.connect().await;
        fx.send(&listener, "add event", json!("x")).await;
        fx.send(&listener, "application", json!("A")).await;
        fx.send(&app_publisher, "application", json!("A")).await;
        let before = listener_sink.frames().len();

        fx.send(&app_publisher, "send to event", json!({"event": "x", "data": 1}))
            .await;
        assert_eq!(listener_sink.frames().len(), before);

        let payload = json!({"event": "x", "data": 2});
        fx.send(&default_publisher, "send to event", payload).await;
        assert_eq!(listener_sink.frames().len(), before + 1);
        assert_eq!(last(&listener_sink)["data"]["data"], 2);

        fx.send(&listener, "events", Value::Null).await;
        assert_eq!(last(&listener_sink), json!({"action": "events", "data": ["x"]}));
    }

    #[tokio::test]
    async fn shape_mismatch_replies_with_error() {
        let fx = Fixture::new();
        let (conn, sink) = fx.connect().await;

        fx.send(&conn, "add event", json!(3)).await;
        assert_eq!(
            last(&sink),
            json!({"action": "add event", "data": "Invalid data type for add event"})
        );

        fx.send(&conn, "send to event", json!("t")).await;
        assert_eq!(
            last(&sink),
            json!({"action": "send to event", "data": "Invalid data type for send to event"})
        );
        assert!(conn.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_action_replies_with_error() {
        let fx = Fixture::new();
        let (conn, sink) = fx.connect().await;
        fx.send(&conn, "fly", json!(1)).await;
        assert_eq!(last(&sink), json!({"action": "fly", "data": "Unknown action: fly"}));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_subscribers_get_exactly_their_topic() {
        let fx = Arc::new(Fixture::new());
        let mut clients = Vec::new();
        for _ in 0..16 {
            clients.push(fx.connect().await);
        }

        let mut tasks = Vec::new();
        for (i, (conn, _)) in clients.iter().enumerate() {
            let fx = Arc::clone(&fx);
            let conn = Arc::clone(conn);
            tasks.push(tokio::spawn(async move {
                fx.send(&conn, "add event", json!(format!("topic-{i}"))).await;
            }));
        }
        for task in tasks {
            let Ok(()) = task.await else {
                panic!("subscribe task panicked");
            };
        }

        let Some((publisher, _)) = clients.first() else {
            panic!("no clients");
        };
        for i in 0..clients.len() {
            let payload = json!({"event": format!("topic-{i}"), "data": i});
            fx.send(publisher, "send to event", payload).await;
        }

        assert_eq!(fx.registry.len().await, 16);
        for (i, (_, sink)) in clients.iter().enumerate() {
            let events: Vec<Value> = sink
                .frames()
                .into_iter()
                .filter(|f| f["action"] == "send to event")
                .collect();
            assert_eq!(events.len(), 1, "client {i}");
            let Some(event) = events.first() else {
                panic!("missing event");
            };
            assert_eq!(event["data"]["event"], format!("topic-{i}"));
            assert_eq!(event["data"]["data"], i);
        }
    }
}
