//! TCP server engine for the chat relay.
//!
//! One task per connection reads length-prefixed JSON commands; a writer
//! task per connection drains the outbound frame queue. All shared state
//! lives in the [`ConnectionRegistry`].

use crate::config::Config;
use crate::core::{
    command::{decode_command, ClientCommand},
    connection::{spawn_connection_writer, Connection, ConnectionId},
    registry::ConnectionRegistry,
    wire::{encode_frame, extract_frame, ServerFrame},
};
use crate::relay::dispatcher::RelayDispatcher;

use bytes::BytesMut;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task;
use tracing::{debug, error, info, warn};

const INBUF_INIT: usize = 8 * 1024;

/// Starts the relay server with the given configuration.
///
/// The only fatal startup error is a failed bind.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let bind_addr = &config.server.bind_addr;
    info!("Starting chatrelay on {}", bind_addr);

    let listener = TcpListener::bind(bind_addr).await?;
    serve_on(listener, config).await
}

/// Accept loop on an already-bound listener.
///
/// Split out so tests can bind an ephemeral port first.
pub async fn serve_on(listener: TcpListener, config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let registry = Arc::new(ConnectionRegistry::new());
    let dispatcher = RelayDispatcher::new(Arc::clone(&registry));
    let active = Arc::new(AtomicUsize::new(0));

    loop {
        let (socket, peer_addr) = listener.accept().await?;

        if active.load(Ordering::Acquire) >= config.server.max_connections {
            warn!("refusing {}: connection limit reached", peer_addr);
            drop(socket);
            continue;
        }
        socket.set_nodelay(true)?;
        info!("Client connected: {}", peer_addr);

        active.fetch_add(1, Ordering::AcqRel);
        let active = Arc::clone(&active);
        let registry = Arc::clone(&registry);
        let dispatcher = dispatcher.clone();
        let config = Arc::clone(&config);

        task::spawn(async move {
            if let Err(e) = handle_connection(socket, registry, dispatcher, config).await {
                error!("Error handling {}: {:?}", peer_addr, e);
            }
            active.fetch_sub(1, Ordering::AcqRel);
            info!("Client disconnected: {}", peer_addr);
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    registry: Arc<ConnectionRegistry>,
    dispatcher: RelayDispatcher,
    config: Arc<Config>,
) -> anyhow::Result<()> {
    let (reader_half, writer_half) = stream.into_split();
    let mut reader = BufReader::new(reader_half);

    let outbound = spawn_connection_writer(writer_half, config.delivery.queue_capacity);
    let connection_id = ConnectionId::new();
    let connection = Connection::new(connection_id.clone(), outbound.clone());

    // Reusable decode buffer; commands coalesce across reads.
    let mut inbuf = BytesMut::with_capacity(INBUF_INIT);

    'io: loop {
        let n = reader.read_buf(&mut inbuf).await?;
        if n == 0 {
            // EOF
            break 'io;
        }

        // Parse as many complete frames as available.
        loop {
            let payload = match extract_frame(&mut inbuf, config.server.max_frame_bytes) {
                Ok(Some(payload)) => payload,
                Ok(None) => break,
                Err(e) => {
                    // Oversized frame; drop the connection to protect the relay.
                    error!(connection = %connection_id, "dropping connection: {e}");
                    break 'io;
                }
            };

            let cmd = match decode_command(&payload) {
                Ok(cmd) => cmd,
                Err(e) => {
                    // Malformed payload is rejected, never broadcast.
                    warn!(connection = %connection_id, "rejecting malformed command: {e}");
                    let reject = encode_frame(&ServerFrame::Error {
                        reason: e.to_string(),
                    })?;
                    if outbound.send_async(reject).await.is_err() {
                        break 'io;
                    }
                    continue;
                }
            };

            match cmd {
                ClientCommand::Subscribe { topic } => {
                    // Ack precedes the registry insert, so a subscriber
                    // never sees a delivery for this topic before its ack.
                    let ack = encode_frame(&ServerFrame::Ack {
                        topic: topic.clone(),
                        info: "subscribed".into(),
                    })?;
                    if outbound.send_async(ack).await.is_err() {
                        break 'io;
                    }
                    registry.subscribe(topic, connection.clone());
                }

                ClientCommand::Unsubscribe { topic } => {
                    registry.unsubscribe(&topic, &connection_id);
                }

                ClientCommand::Publish { topic, message } => {
                    match dispatcher.publish(&topic, &message) {
                        Ok(delivered) => {
                            debug!(topic = %topic, delivered, connection = %connection_id, "relayed message");
                        }
                        Err(e) => error!(topic = %topic, "publish failed: {e}"),
                    }
                }

                ClientCommand::Quit => break 'io,
            }
        }
    }

    // Cleanup removes every subscription; dropping the last sender lets the
    // writer task drain and exit.
    registry.drop_connection(&connection_id);

    Ok(())
}
