use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::chat::ChatMessage;
use crate::core::error::RelayError;
use crate::core::wire::prefix_frame;

/// Commands a client may send to the relay.
///
/// Wire form is a length-prefixed JSON object tagged by `action`, e.g.
/// `{"action":"publish","topic":"messages","message":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    Publish { topic: String, message: ChatMessage },
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    Quit,
}

/// Serialize a command to a length-prefixed wire frame.
pub fn encode_command(cmd: &ClientCommand) -> Result<Bytes, RelayError> {
    let data = serde_json::to_vec(cmd)?;
    Ok(prefix_frame(&data))
}

/// Deserialize a command from a frame payload (no length prefix).
pub fn decode_command(bytes: &[u8]) -> Result<ClientCommand, RelayError> {
    Ok(serde_json::from_slice(bytes)?)
}
