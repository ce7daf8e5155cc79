use dashmap::DashMap;

use crate::core::connection::{Connection, ConnectionId};

/// Alias for a topic name.
pub type TopicName = String;

/// [`ConnectionRegistry`] tracks which connections are subscribed to which
/// topics.
///
/// Shared by every connection task; DashMap provides the synchronization.
/// Topics exist only while they have at least one subscriber.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    topics: DashMap<TopicName, DashMap<ConnectionId, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
        }
    }

    /// Registers `connection` under `topic`.
    ///
    /// Idempotent: re-subscribing replaces the stored handle, so a
    /// connection never receives a message twice for one publish.
    pub fn subscribe(&self, topic: impl Into<TopicName>, connection: Connection) {
        self.topics
            .entry(topic.into())
            .or_default()
            .insert(connection.id().clone(), connection);
    }

    /// Removes the association; no-op if absent.
    pub fn unsubscribe(&self, topic: &str, id: &ConnectionId) {
        if let Some(subs) = self.topics.get(topic) {
            subs.remove(id);
        }
        self.topics.remove_if(topic, |_, subs| subs.is_empty());
    }

    /// Snapshot of the current subscribers of `topic`.
    ///
    /// Empty if the topic has never been seen. The snapshot is what the
    /// dispatcher fans out to; connections subscribing after this call do
    /// not receive the in-flight message.
    pub fn subscribers_of(&self, topic: &str) -> Vec<Connection> {
        self.topics
            .get(topic)
            .map(|subs| subs.iter().map(|entry| entry.value().clone()).collect())
            .unwrap_or_default()
    }

    /// Removes `id` from every topic it is subscribed to.
    ///
    /// Called when a connection closes or a delivery finds its channel
    /// gone; absent subscriptions are not an error.
    pub fn drop_connection(&self, id: &ConnectionId) {
        for subs in self.topics.iter() {
            subs.value().remove(id);
        }
        self.topics.retain(|_, subs| !subs.is_empty());
    }

    /// Number of topics with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}
