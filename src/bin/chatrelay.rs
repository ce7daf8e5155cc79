//! chatrelay – one binary that can start the relay *or* act as an
//! interactive chat shell.
//
//  $ chatrelay start --config chatrelay.toml
//  $ chatrelay connect 127.0.0.1:9800 --name alice
//  > join lobby
//  > say lobby hello everyone
//  [lobby] alice: hello everyone
use chatrelay::config::CONFIG;
use chatrelay::core::chat::ChatMessage;
use chatrelay::core::command::{encode_command, ClientCommand};
use chatrelay::core::wire::{decode_frame, extract_frame, ServerFrame};
use chatrelay::{load_config, start_relay, Config};

use clap::{Parser, Subcommand};
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};

use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

#[derive(Debug, Parser)]
#[command(name = "chatrelay", version, about = "chatrelay daemon & chat shell")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the relay daemon.
    Start {
        /// Path to config TOML (env CHATRELAY_CONFIG overrides)
        #[arg(short, long, default_value = "chatrelay.toml")]
        config: String,
    },
    /// Connect to a running relay in interactive mode.
    Connect {
        /// Relay address (host:port)
        addr: SocketAddr,
        /// Sender name attached to published messages
        #[arg(short, long, default_value = "anon")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Start { config } => {
            let cfg_path: String = std::env::var("CHATRELAY_CONFIG").unwrap_or(config);
            let cfg: Config = load_config(&cfg_path)?;
            println!("chatrelay listening on {}", cfg.server.bind_addr);
            start_relay(cfg).await?;
        }
        Command::Connect { addr, name } => repl(addr, name).await?,
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────
// Interactive chat shell
// ───────────────────────────────────────────────────────────
async fn repl(addr: SocketAddr, name: String) -> anyhow::Result<()> {
    let mut rl: Editor<(), DefaultHistory> = DefaultEditor::new()?;

    let stream = TcpStream::connect(addr).await?;
    let (mut r, mut w) = stream.into_split();

    println!("Connected to {addr} as {name}. Type `help` for commands.");

    // Background task to receive and print relayed messages.
    let printer: JoinHandle<()> = tokio::spawn(async move {
        let max_frame = CONFIG.server.max_frame_bytes;
        let mut buf = BytesMut::with_capacity(8 * 1024);
        loop {
            match extract_frame(&mut buf, max_frame) {
                Ok(Some(payload)) => match decode_frame(&payload) {
                    Ok(ServerFrame::Message { topic, message }) => {
                        println!("[{topic}] {}: {}", message.sender, message.body);
                    }
                    Ok(ServerFrame::Ack { topic, info }) => println!("* {info} ({topic})"),
                    Ok(ServerFrame::Error { reason }) => eprintln!("! rejected: {reason}"),
                    Err(e) => eprintln!("! failed to decode frame: {e}"),
                },
                Ok(None) => {
                    if r.read_buf(&mut buf).await.unwrap_or(0) == 0 {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("! {e}");
                    break;
                }
            }
        }
    });

    // Main interactive loop
    loop {
        let Ok(line) = rl.readline("> ") else { break };
        let _ = rl.add_history_entry(line.as_str());

        match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["help"] => println!("join <topic> | leave <topic> | say <topic> <text> | exit"),
            ["exit" | "quit"] => break,

            ["join", topic] => {
                let cmd = ClientCommand::Subscribe {
                    topic: (*topic).to_string(),
                };
                send_command(&mut w, &cmd).await?;
            }

            ["leave", topic] => {
                let cmd = ClientCommand::Unsubscribe {
                    topic: (*topic).to_string(),
                };
                send_command(&mut w, &cmd).await?;
            }

            ["say", topic, rest @ ..] if !rest.is_empty() => {
                let cmd = ClientCommand::Publish {
                    topic: (*topic).to_string(),
                    message: ChatMessage::stamped(name.clone(), rest.join(" ")),
                };
                send_command(&mut w, &cmd).await?;
            }

            _ => println!("Unknown cmd. Type `help`."),
        }
    }

    let _ = send_command(&mut w, &ClientCommand::Quit).await;
    drop(w);
    let _ = printer.await;
    Ok(())
}

async fn send_command(w: &mut OwnedWriteHalf, cmd: &ClientCommand) -> anyhow::Result<()> {
    let frame = encode_command(cmd)?;
    w.write_all(&frame).await?;
    w.flush().await?;
    Ok(())
}
