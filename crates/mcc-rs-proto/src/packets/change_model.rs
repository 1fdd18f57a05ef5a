//! ChangeModel (0x1D) — Server → Client.

use bytes::BufMut;

use crate::codec::{self, Packet, ProtoEncode};
use crate::packets::id;
use crate::types::EntityRef;

#[derive(Debug, Clone)]
pub struct ChangeModel {
    pub entity: EntityRef,
    pub model: String,
}

impl ProtoEncode for ChangeModel {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.entity.wire_id());
        codec::write_string(buf, &self.model);
    }
}

impl Packet for ChangeModel {
    const ID: u8 = id::CHANGE_MODEL;
}
