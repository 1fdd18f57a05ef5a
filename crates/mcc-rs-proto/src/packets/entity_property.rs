//! SetEntityProperty (0x2A) — Server → Client.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;
use crate::types::EntityRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntityPropertyType {
    RotationX = 0,
    RotationY = 1,
    RotationZ = 2,
}

#[derive(Debug, Clone, Copy)]
pub struct SetEntityProperty {
    pub entity: EntityRef,
    pub property: EntityPropertyType,
    pub value: i32,
}

impl ProtoEncode for SetEntityProperty {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity.wire_id());
        buf.put_u8(self.property as u8);
        buf.put_i32(self.value);
    }
}

impl Packet for SetEntityProperty {
    const ID: u8 = id::SET_ENTITY_PROPERTY;
}
