//! Client → Server packets.
//!
//! Every inbound packet has a fixed size determined by its tag. The only
//! exception is the position report, which widens when ExtEntityPositions
//! is negotiated.

use bytes::Buf;

use crate::codec::{ensure_remaining, ProtoDecode};
use crate::error::ProtoError;
use crate::packets::message::ClientMessage;
use crate::packets::{
    id, ClientIdentification, ClientPosition, CustomBlockSupportLevel, ExtEntryPacket, ExtInfo,
    PlayerClicked, SetBlockClient, TwoWayPing,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientPacket {
    Identification(ClientIdentification),
    SetBlock(SetBlockClient),
    Position(ClientPosition),
    Message(ClientMessage),
    ExtInfo(ExtInfo),
    ExtEntry(ExtEntryPacket),
    CustomBlockSupportLevel(CustomBlockSupportLevel),
    PlayerClicked(PlayerClicked),
    TwoWayPing(TwoWayPing),
}

impl ClientPacket {
    /// Total frame size for `tag`, including the tag byte, or `None` if the
    /// tag is not a client packet.
    pub fn packet_size(tag: u8, extended_positions: bool) -> Option<usize> {
        let size = match tag {
            id::IDENTIFICATION => 131,
            id::SET_BLOCK_CLIENT => 9,
            id::TELEPORT if extended_positions => 16,
            id::TELEPORT => 10,
            id::MESSAGE => 66,
            id::EXT_INFO => 67,
            id::EXT_ENTRY => 69,
            id::CUSTOM_BLOCK_SUPPORT_LEVEL => 2,
            id::PLAYER_CLICKED => 15,
            id::TWO_WAY_PING => 4,
            _ => return None,
        };
        Some(size)
    }

    /// Decode one complete frame, starting at the tag byte.
    pub fn decode(buf: &mut impl Buf, extended_positions: bool) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 1)?;
        let tag = buf.get_u8();
        let packet = match tag {
            id::IDENTIFICATION => Self::Identification(ClientIdentification::proto_decode(buf)?),
            id::SET_BLOCK_CLIENT => Self::SetBlock(SetBlockClient::proto_decode(buf)?),
            id::TELEPORT => Self::Position(ClientPosition::decode(buf, extended_positions)?),
            id::MESSAGE => Self::Message(ClientMessage::proto_decode(buf)?),
            id::EXT_INFO => Self::ExtInfo(ExtInfo::proto_decode(buf)?),
            id::EXT_ENTRY => Self::ExtEntry(ExtEntryPacket::proto_decode(buf)?),
            id::CUSTOM_BLOCK_SUPPORT_LEVEL => {
                Self::CustomBlockSupportLevel(CustomBlockSupportLevel::proto_decode(buf)?)
            }
            id::PLAYER_CLICKED => Self::PlayerClicked(PlayerClicked::proto_decode(buf)?),
            id::TWO_WAY_PING => Self::TwoWayPing(TwoWayPing::proto_decode(buf)?),
            other => return Err(ProtoError::UnknownPacketId(other)),
        };
        Ok(packet)
    }

    /// The tag this packet arrived with.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Identification(_) => id::IDENTIFICATION,
            Self::SetBlock(_) => id::SET_BLOCK_CLIENT,
            Self::Position(_) => id::TELEPORT,
            Self::Message(_) => id::MESSAGE,
            Self::ExtInfo(_) => id::EXT_INFO,
            Self::ExtEntry(_) => id::EXT_ENTRY,
            Self::CustomBlockSupportLevel(_) => id::CUSTOM_BLOCK_SUPPORT_LEVEL,
            Self::PlayerClicked(_) => id::PLAYER_CLICKED,
            Self::TwoWayPing(_) => id::TWO_WAY_PING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{self, ProtoEncode};
    use bytes::{BufMut, BytesMut};

    #[test]
    fn sizes_match_wire_layouts() {
        assert_eq!(ClientPacket::packet_size(0x00, false), Some(131));
        assert_eq!(ClientPacket::packet_size(0x08, false), Some(10));
        assert_eq!(ClientPacket::packet_size(0x08, true), Some(16));
        assert_eq!(ClientPacket::packet_size(0x11, false), Some(69));
        assert_eq!(ClientPacket::packet_size(0x06, false), None);
        assert_eq!(ClientPacket::packet_size(0xFE, false), None);
    }

    #[test]
    fn decode_ext_entry_frame() {
        let mut buf = BytesMut::new();
        buf.put_u8(id::EXT_ENTRY);
        ExtEntryPacket {
            name: "FastMap".into(),
            version: 1,
        }
        .proto_encode(&mut buf);
        assert_eq!(buf.len(), 69);
        let packet = ClientPacket::decode(&mut buf.freeze(), false).unwrap();
        assert_eq!(packet.tag(), id::EXT_ENTRY);
        assert!(matches!(packet, ClientPacket::ExtEntry(e) if e.name == "FastMap"));
    }

    #[test]
    fn decode_message_frame() {
        let mut buf = BytesMut::new();
        buf.put_u8(id::MESSAGE);
        buf.put_u8(0xFF);
        codec::write_string(&mut buf, "hello");
        let packet = ClientPacket::decode(&mut buf.freeze(), false).unwrap();
        assert!(matches!(packet, ClientPacket::Message(m) if m.text == "hello"));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let mut buf = BytesMut::new();
        buf.put_u8(0x7F);
        assert!(matches!(
            ClientPacket::decode(&mut buf.freeze(), false),
            Err(ProtoError::UnknownPacketId(0x7F))
        ));
    }
}
