#[path = "common.rs"]
mod common;

use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::time::{timeout, Duration};

use chatrelay::core::chat::ChatMessage;
use chatrelay::core::connection::{spawn_connection_writer, Connection, ConnectionId};
use chatrelay::core::registry::ConnectionRegistry;
use chatrelay::core::wire::ServerFrame;
use chatrelay::relay::RelayDispatcher;

#[tokio::test]
async fn duplicate_subscribe_delivers_once() {
    common::init_logging();

    let registry = Arc::new(ConnectionRegistry::new());
    let dispatcher = RelayDispatcher::new(registry.clone());

    let (client, mut server) = tokio::io::duplex(1024);
    let tx = spawn_connection_writer(client, 64);
    let id = ConnectionId::new();

    // Subscribing twice has the effect of once.
    registry.subscribe("room", Connection::new(id.clone(), tx.clone()));
    registry.subscribe("room", Connection::new(id.clone(), tx));
    assert_eq!(registry.subscribers_of("room").len(), 1);

    let msg = ChatMessage::new("bob", "hi");
    assert_eq!(dispatcher.publish("room", &msg).unwrap(), 1);

    match common::read_frame(&mut server).await {
        ServerFrame::Message { message, .. } => assert_eq!(message, msg),
        other => panic!("unexpected frame: {other:?}"),
    }

    // No second copy arrives.
    let mut byte = [0u8; 1];
    let extra = timeout(Duration::from_millis(50), server.read_exact(&mut byte)).await;
    assert!(extra.is_err(), "received an unexpected duplicate frame");
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    common::init_logging();

    let registry = Arc::new(ConnectionRegistry::new());
    let dispatcher = RelayDispatcher::new(registry.clone());

    let (client, mut server) = tokio::io::duplex(1024);
    let tx = spawn_connection_writer(client, 64);
    let id = ConnectionId::new();
    // Keep a sender clone alive so the writer task does not shut down (and
    // close the socket) when the registry's clone is dropped on unsubscribe —
    // mirrors the connection handler owning the sender in production.
    let _keepalive = tx.clone();
    registry.subscribe("room", Connection::new(id.clone(), tx));

    registry.unsubscribe("room", &id);
    assert!(registry.subscribers_of("room").is_empty());

    let msg = ChatMessage::new("bob", "hi");
    assert_eq!(dispatcher.publish("room", &msg).unwrap(), 0);

    let mut byte = [0u8; 1];
    let extra = timeout(Duration::from_millis(50), server.read_exact(&mut byte)).await;
    assert!(extra.is_err(), "unsubscribed connection still received data");
}

#[tokio::test]
async fn unsubscribe_of_absent_subscription_is_a_noop() {
    let registry = ConnectionRegistry::new();
    registry.unsubscribe("never-seen", &ConnectionId::new());
    assert_eq!(registry.topic_count(), 0);
}

#[tokio::test]
async fn dropping_a_connection_clears_every_topic() {
    common::init_logging();

    let registry = Arc::new(ConnectionRegistry::new());
    let dispatcher = RelayDispatcher::new(registry.clone());

    let (client, _server) = tokio::io::duplex(1024);
    let tx = spawn_connection_writer(client, 64);
    let id = ConnectionId::new();
    registry.subscribe("alpha", Connection::new(id.clone(), tx.clone()));
    registry.subscribe("beta", Connection::new(id.clone(), tx));
    assert_eq!(registry.topic_count(), 2);

    registry.drop_connection(&id);
    assert_eq!(registry.topic_count(), 0);

    let msg = ChatMessage::new("bob", "hi");
    assert_eq!(dispatcher.publish("alpha", &msg).unwrap(), 0);
    assert_eq!(dispatcher.publish("beta", &msg).unwrap(), 0);
}
