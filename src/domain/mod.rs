//! Domain layer: connections, subscriptions, the registry and the reaper.
//!
//! This module contains the hub's in-memory model: connection identity,
//! the per-connection subscription set, the transport boundary, the wire
//! envelopes, the connection registry with its broadcast primitive, and
//! the liveness reaper.

pub mod connection;
pub mod connection_id;
pub mod envelope;
pub mod reaper;
pub mod registry;
pub mod subscription;
pub mod transport;

pub use connection::Connection;
pub use connection_id::ConnectionId;
pub use envelope::{ActionEnvelope, EventData, EventEnvelope};
pub use reaper::LivenessReaper;
pub use registry::ConnectionRegistry;
pub use subscription::{SubscriptionSet, TopicKey};
pub use transport::{FrameSink, InboundFrame};
