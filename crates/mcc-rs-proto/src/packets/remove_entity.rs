//! RemoveEntity (0x0C) — Server → Client.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;
use crate::types::EntityRef;

#[derive(Debug, Clone, Copy)]
pub struct RemoveEntity {
    pub entity: EntityRef,
}

impl ProtoEncode for RemoveEntity {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity.wire_id());
    }
}

impl Packet for RemoveEntity {
    const ID: u8 = id::REMOVE_ENTITY;
}
