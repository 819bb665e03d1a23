//! Per-connection subscription set.
//!
//! Tracks which topics a client listens to and the namespace that scopes
//! them. Every subscription is stored namespace-qualified (`namespace:topic`)
//! using the namespace that was current when it was made, so two
//! applications may reuse the same topic name without seeing each other's
//! traffic.

use std::fmt;

/// Namespace-qualified topic name used for subscription matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicKey {
    namespace: String,
    topic: String,
}

impl TopicKey {
    /// Qualifies `topic` with `namespace`.
    #[must_use]
    pub fn new(namespace: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            topic: topic.into(),
        }
    }

    /// Bare topic name, as the client spelled it.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.topic)
    }
}

/// Topics a single connection is subscribed to.
///
/// Keys are qualified with the namespace current at subscribe time and
/// keep it when the namespace later changes. Insertion order is kept so
/// that listing subscriptions is stable.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionSet {
    namespace: String,
    keys: Vec<TopicKey>,
}

impl SubscriptionSet {
    /// Creates an empty set in the default (empty) namespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Replaces the namespace used for subsequent subscribe, unsubscribe
    /// and publish calls. Existing subscriptions are left untouched.
    pub fn set_namespace(&mut self, namespace: impl Into<String>) {
        self.namespace = namespace.into();
    }

    /// Qualifies `topic` with the current namespace.
    #[must_use]
    pub fn key_for(&self, topic: &str) -> TopicKey {
        TopicKey::new(self.namespace.as_str(), topic)
    }

    /// Adds `topic` in the current namespace. Returns `false` if it was
    /// already present.
    pub fn subscribe(&mut self, topic: &str) -> bool {
        let key = self.key_for(topic);
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    /// Removes `topic` from the current namespace. Returns `false` if it
    /// was not present.
    pub fn unsubscribe(&mut self, topic: &str) -> bool {
        let key = self.key_for(topic);
        let before = self.keys.len();
        self.keys.retain(|k| *k != key);
        self.keys.len() != before
    }

    /// Returns `true` if `key` is one of the subscribed keys.
    #[must_use]
    pub fn matches(&self, key: &TopicKey) -> bool {
        self.keys.contains(key)
    }

    /// Bare topic names of every subscription, in subscription order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(TopicKey::topic)
    }
}
