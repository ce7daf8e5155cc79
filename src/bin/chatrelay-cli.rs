//! CLI client for a running chatrelay instance.
//!
//! Provides a convenient command-line interface for publishing, subscribing,
//! and unsubscribing from topics, suitable for scripting and smoke tests.

use bytes::BytesMut;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;

use chatrelay::config::CONFIG;
use chatrelay::core::chat::ChatMessage;
use chatrelay::core::command::{encode_command, ClientCommand};
use chatrelay::core::wire::{decode_frame, extract_frame, ServerFrame};

/// Command-line interface for chatrelay.
#[derive(Debug, Parser)]
#[command(
    name = "chatrelay-cli",
    version,
    about = "chatrelay CLI: pub/sub/unsub commands"
)]
pub struct Cli {
    /// Address of the relay (e.g. 127.0.0.1:9800)
    #[arg(short, long, default_value = "127.0.0.1:9800")]
    pub addr: SocketAddr,

    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Publish a chat message to a topic
    Pub {
        /// Topic name
        topic: String,
        /// Sender name attached to the message
        #[arg(short, long, default_value = "cli")]
        sender: String,
        /// Message body (enclose in quotes for spaces)
        message: String,
    },

    /// Stream messages from a topic
    Sub {
        /// Topic name
        topic: String,
    },

    /// Unsubscribe from a topic
    Unsub {
        /// Topic name
        topic: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut stream = TcpStream::connect(cli.addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to {}: {}", cli.addr, e))?;

    let (mut read_half, mut write_half) = stream.split();

    // Build and send command
    let cmd = match &cli.command {
        Command::Pub {
            topic,
            sender,
            message,
        } => {
            if message.len() > CONFIG.server.max_frame_bytes {
                return Err(anyhow::anyhow!(
                    "Message size ({}) exceeds the relay's frame limit ({})",
                    message.len(),
                    CONFIG.server.max_frame_bytes
                ));
            }
            ClientCommand::Publish {
                topic: topic.clone(),
                message: ChatMessage::stamped(sender.clone(), message.clone()),
            }
        }
        Command::Sub { topic } => ClientCommand::Subscribe {
            topic: topic.clone(),
        },
        Command::Unsub { topic } => ClientCommand::Unsubscribe {
            topic: topic.clone(),
        },
    };

    let frame = encode_command(&cmd)?;
    write_half.write_all(&frame).await?;
    write_half.flush().await?;
    info!("Sent request");

    // Only Sub stays connected to stream frames.
    if matches!(cli.command, Command::Sub { .. }) {
        let max_frame = CONFIG.server.max_frame_bytes;
        let mut buf = BytesMut::with_capacity(8 * 1024);

        loop {
            match extract_frame(&mut buf, max_frame) {
                Ok(Some(payload)) => match decode_frame(&payload) {
                    Ok(ServerFrame::Ack { info, .. }) => println!("> {info}"),
                    Ok(ServerFrame::Message { message, .. }) => match message.timestamp {
                        Some(ts) => println!("{}: {} @{}", message.sender, message.body, ts),
                        None => println!("{}: {}", message.sender, message.body),
                    },
                    Ok(ServerFrame::Error { reason }) => eprintln!("> rejected: {reason}"),
                    Err(e) => eprintln!("> Failed to decode frame: {e}"),
                },
                Ok(None) => {
                    if read_half.read_buf(&mut buf).await? == 0 {
                        break;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!("Subscription ended");
    }

    Ok(())
}
