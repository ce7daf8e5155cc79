//! Wire framing for the relay protocol.
//!
//! Every frame is a 4-byte big-endian length prefix followed by a UTF-8
//! JSON payload. Inbound payloads decode to `ClientCommand`; outbound
//! payloads are `ServerFrame`s.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::core::chat::ChatMessage;
use crate::core::error::RelayError;

/// Frames the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Acknowledges a subscribe.
    Ack { topic: String, info: String },
    /// Reports a rejected command; the connection stays open.
    Error { reason: String },
    /// A relayed chat message, forwarded unchanged.
    Message { topic: String, message: ChatMessage },
}

/// Prepends the 4-byte length prefix to a serialized payload.
pub(crate) fn prefix_frame(data: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(4 + data.len());
    buf.put_u32(data.len() as u32);
    buf.extend_from_slice(data);
    buf.freeze()
}

/// Serialize a `ServerFrame` to a length-prefixed wire frame.
pub fn encode_frame(frame: &ServerFrame) -> Result<Bytes, RelayError> {
    let data = serde_json::to_vec(frame)?;
    Ok(prefix_frame(&data))
}

/// Builds the delivery frame for a message on a topic.
///
/// The dispatcher encodes once and hands the same bytes to every
/// subscriber's queue.
pub fn encode_message_frame(topic: &str, message: &ChatMessage) -> Result<Bytes, RelayError> {
    encode_frame(&ServerFrame::Message {
        topic: topic.to_string(),
        message: message.clone(),
    })
}

/// Deserialize a `ServerFrame` from a frame payload (no length prefix).
pub fn decode_frame(bytes: &[u8]) -> Result<ServerFrame, RelayError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Extracts one complete frame payload from `buf`, if available.
///
/// Returns `Ok(None)` until the length prefix and full payload have been
/// buffered; partial reads are normal. A declared length above
/// `max_frame_bytes` is an error and the caller should drop the connection.
pub fn extract_frame(
    buf: &mut BytesMut,
    max_frame_bytes: usize,
) -> Result<Option<Bytes>, RelayError> {
    if buf.len() < 4 {
        return Ok(None);
    }

    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > max_frame_bytes {
        return Err(RelayError::FrameTooLarge(len));
    }
    if buf.len() < 4 + len {
        return Ok(None);
    }

    buf.advance(4);
    Ok(Some(buf.split_to(len).freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{decode_command, encode_command, ClientCommand};

    #[test]
    fn extract_waits_for_full_frame() {
        let frame = encode_frame(&ServerFrame::Ack {
            topic: "messages".into(),
            info: "subscribed".into(),
        })
        .unwrap();

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&frame[..3]);
        assert!(extract_frame(&mut buf, 1024).unwrap().is_none());

        buf.extend_from_slice(&frame[3..frame.len() - 1]);
        assert!(extract_frame(&mut buf, 1024).unwrap().is_none());

        buf.extend_from_slice(&frame[frame.len() - 1..]);
        let payload = extract_frame(&mut buf, 1024).unwrap().unwrap();
        assert!(matches!(
            decode_frame(&payload).unwrap(),
            ServerFrame::Ack { .. }
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn oversized_declared_length_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32(10_000);
        match extract_frame(&mut buf, 1024) {
            Err(RelayError::FrameTooLarge(len)) => assert_eq!(len, 10_000),
            other => panic!("expected FrameTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn garbage_payload_fails_to_decode() {
        assert!(decode_command(b"not json at all").is_err());
        assert!(decode_frame(b"{\"frame\":\"nope\"}").is_err());
    }

    #[test]
    fn command_roundtrip_preserves_message() {
        let cmd = ClientCommand::Publish {
            topic: "messages".into(),
            message: ChatMessage::new("bob", "hi"),
        };
        let frame = encode_command(&cmd).unwrap();
        // Skip the 4-byte prefix when decoding directly.
        let decoded = decode_command(&frame[4..]).unwrap();
        assert_eq!(decoded, cmd);
    }

    #[test]
    fn absent_timestamp_is_omitted_on_the_wire() {
        let json = serde_json::to_string(&ChatMessage::new("bob", "hi")).unwrap();
        assert!(!json.contains("timestamp"));

        let parsed: ChatMessage = serde_json::from_str("{\"sender\":\"bob\",\"body\":\"hi\"}").unwrap();
        assert_eq!(parsed, ChatMessage::new("bob", "hi"));
    }
}
