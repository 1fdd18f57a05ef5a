//! AddEntity (0x07) and ExtAddEntity2 (0x21) — Server → Client.
//!
//! Both spawn an entity at a location. ExtAddEntity2 additionally carries a
//! skin name and is only sent to sessions that negotiated ExtPlayerList.

use bytes::BufMut;

use crate::codec::{self, Packet, ProtoEncode};
use crate::packets::id;
use crate::types::{EntityRef, Location};

/// Classic spawn packet.
#[derive(Debug, Clone)]
pub struct AddEntity {
    pub entity: EntityRef,
    pub display_name: String,
    pub location: Location,
    /// Write 32-bit positions (ExtEntityPositions).
    pub extended_positions: bool,
}

impl ProtoEncode for AddEntity {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity.wire_id());
        codec::write_string(buf, &self.display_name);
        codec::write_position(buf, &self.location, self.extended_positions);
        codec::write_orientation(buf, &self.location);
    }
}

impl Packet for AddEntity {
    const ID: u8 = id::ADD_ENTITY;
}

/// ExtPlayerList v2 spawn packet with a skin name.
#[derive(Debug, Clone)]
pub struct ExtAddEntity2 {
    pub entity: EntityRef,
    pub display_name: String,
    pub skin_name: String,
    pub location: Location,
    pub extended_positions: bool,
}

impl ProtoEncode for ExtAddEntity2 {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity.wire_id());
        codec::write_string(buf, &self.display_name);
        codec::write_string(buf, &self.skin_name);
        codec::write_position(buf, &self.location, self.extended_positions);
        codec::write_orientation(buf, &self.location);
    }
}

impl Packet for ExtAddEntity2 {
    const ID: u8 = id::EXT_ADD_ENTITY2;
}
