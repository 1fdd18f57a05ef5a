//! ExtAddPlayerName (0x16) and ExtRemovePlayerName (0x18) — Server → Client.
//!
//! Tab-list entries for ExtPlayerList sessions. The name ID is a 16-bit field
//! that mirrors the entity ID.

use bytes::BufMut;

use crate::codec::{self, Packet, ProtoEncode};
use crate::packets::id;
use crate::types::EntityRef;

#[derive(Debug, Clone)]
pub struct ExtAddPlayerName {
    pub entity: EntityRef,
    pub player_name: String,
    pub list_name: String,
    pub group_name: String,
    pub group_rank: u8,
}

impl ProtoEncode for ExtAddPlayerName {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.entity.wire_id() as i16);
        codec::write_string(buf, &self.player_name);
        codec::write_string(buf, &self.list_name);
        codec::write_string(buf, &self.group_name);
        buf.put_u8(self.group_rank);
    }
}

impl Packet for ExtAddPlayerName {
    const ID: u8 = id::EXT_ADD_PLAYER_NAME;
}

#[derive(Debug, Clone, Copy)]
pub struct ExtRemovePlayerName {
    pub entity: EntityRef,
}

impl ProtoEncode for ExtRemovePlayerName {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.entity.wire_id() as i16);
    }
}

impl Packet for ExtRemovePlayerName {
    const ID: u8 = id::EXT_REMOVE_PLAYER_NAME;
}
