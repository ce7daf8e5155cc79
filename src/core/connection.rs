use bytes::Bytes;
use std::fmt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::RelayError;

/// Unique identifier for a client connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        ConnectionId(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle to a connected client's outbound side.
///
/// Cloneable; the registry stores one clone per subscription. The handle
/// never owns the socket, only the sender feeding the writer task.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    outbound: flume::Sender<Bytes>,
}

impl Connection {
    pub fn new(id: ConnectionId, outbound: flume::Sender<Bytes>) -> Self {
        Self { id, outbound }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Queues a pre-encoded frame without blocking.
    pub fn try_send(&self, frame: Bytes) -> Result<(), RelayError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            flume::TrySendError::Full(_) => RelayError::QueueFull,
            flume::TrySendError::Disconnected(_) => RelayError::Disconnected,
        })
    }
}

/// Spawns the writer task for one connection.
///
/// Frames sent on the returned channel are written to the socket in order;
/// the flush is deferred while more frames are queued. The task exits when
/// every sender is dropped or the peer stops reading.
pub fn spawn_connection_writer<W>(mut writer: W, capacity: usize) -> flume::Sender<Bytes>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = flume::bounded::<Bytes>(capacity);

    tokio::spawn(async move {
        while let Ok(frame) = rx.recv_async().await {
            if let Err(e) = writer.write_all(&frame).await {
                debug!("connection writer stopping: {e}");
                break;
            }
            if rx.is_empty() {
                if let Err(e) = writer.flush().await {
                    debug!("connection writer stopping on flush: {e}");
                    break;
                }
            }
        }
    });

    tx
}
