//! Message (0x0D) — both directions.
//!
//! Server → Client the first byte is the message type (MessageTypes); plain
//! clients only understand type 0. Client → Server it is the player ID, or
//! the "more parts follow" flag when LongerMessages is negotiated.

use bytes::{Buf, BufMut};

use crate::codec::{self, ensure_remaining, Packet, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// Where the client renders a message (MessageTypes extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MessageType {
    #[default]
    Chat = 0,
    Status1 = 1,
    Status2 = 2,
    Status3 = 3,
    BottomRight1 = 11,
    BottomRight2 = 12,
    BottomRight3 = 13,
    Announcement = 100,
}

/// Server → Client chat or status line.
#[derive(Debug, Clone)]
pub struct Message {
    pub message_type: MessageType,
    pub text: String,
}

impl Message {
    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Chat,
            text: text.into(),
        }
    }
}

impl ProtoEncode for Message {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.message_type as u8);
        codec::write_string(buf, &self.text);
    }
}

impl Packet for Message {
    const ID: u8 = id::MESSAGE;
}

/// Client → Server chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    /// Player ID byte; 1 means "partial" under LongerMessages.
    pub flag: u8,
    pub text: String,
}

impl ClientMessage {
    /// Whether more parts follow, given the session negotiated LongerMessages.
    pub fn is_partial(&self, longer_messages: bool) -> bool {
        longer_messages && self.flag == 1
    }
}

impl ProtoDecode for ClientMessage {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 1 + codec::STRING_LENGTH)?;
        let flag = buf.get_u8();
        let text = codec::read_string(buf)?;
        Ok(Self { flag, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;
    use bytes::BytesMut;

    #[test]
    fn encode_typed_message() {
        let pkt = Message {
            message_type: MessageType::Announcement,
            text: "Hello".into(),
        };
        let bytes = encode_packet(&pkt);
        assert_eq!(bytes.len(), 66);
        assert_eq!(&bytes[..2], &[0x0D, 100]);
        assert_eq!(&bytes[2..7], b"Hello");
    }

    #[test]
    fn decode_client_message() {
        let mut buf = BytesMut::new();
        buf.put_u8(1);
        codec::write_string(&mut buf, "part one ");
        let msg = ClientMessage::proto_decode(&mut buf.freeze()).unwrap();
        // Trailing padding is trimmed, including the sender's own spaces.
        assert_eq!(msg.text, "part one");
        assert!(msg.is_partial(true));
        assert!(!msg.is_partial(false));
    }
}
