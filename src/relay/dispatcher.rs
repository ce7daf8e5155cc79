use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::chat::ChatMessage;
use crate::core::error::RelayError;
use crate::core::registry::ConnectionRegistry;
use crate::core::wire::encode_message_frame;

/// Stateless fan-out: one publish call forwards a message to every current
/// subscriber of a topic.
///
/// Deliveries are independent; a failed subscriber never blocks the rest.
#[derive(Debug, Clone)]
pub struct RelayDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl RelayDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Forwards `message` unchanged to every subscriber of `topic`.
    ///
    /// Returns the number of queues the frame reached. A subscriber whose
    /// channel is gone is dropped from the registry; a full queue loses
    /// this one message but keeps the subscription. Publishing to a topic
    /// with no subscribers is not an error.
    pub fn publish(&self, topic: &str, message: &ChatMessage) -> Result<usize, RelayError> {
        let subscribers = self.registry.subscribers_of(topic);
        if subscribers.is_empty() {
            debug!(topic, "publish with no subscribers");
            return Ok(0);
        }

        let frame = encode_message_frame(topic, message)?;

        let mut delivered = 0usize;
        for conn in subscribers {
            match conn.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(RelayError::QueueFull) => {
                    warn!(topic, connection = %conn.id(), "subscriber queue full; dropping message");
                }
                Err(e) => {
                    warn!(topic, connection = %conn.id(), "delivery failed ({e}); dropping subscriber");
                    self.registry.drop_connection(conn.id());
                }
            }
        }

        debug!(topic, delivered, "publish fanned out");
        Ok(delivered)
    }
}
