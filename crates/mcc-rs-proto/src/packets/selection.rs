//! MakeSelection (0x1A) and RemoveSelection (0x1B) — Server → Client.

use bytes::BufMut;

use crate::codec::{self, Packet, ProtoEncode};
use crate::packets::id;
use crate::types::{Aabb, Rgba};

/// Draws a labelled, colored cuboid outline.
#[derive(Debug, Clone)]
pub struct MakeSelection {
    pub selection_id: u8,
    pub label: String,
    pub bounds: Aabb,
    pub color: Rgba,
}

impl ProtoEncode for MakeSelection {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.selection_id);
        codec::write_string(buf, &self.label);
        for pos in [self.bounds.min, self.bounds.max] {
            buf.put_i16(pos.x as i16);
            buf.put_i16(pos.y as i16);
            buf.put_i16(pos.z as i16);
        }
        for channel in [self.color.r, self.color.g, self.color.b, self.color.a] {
            buf.put_i16(channel as i16);
        }
    }
}

impl Packet for MakeSelection {
    const ID: u8 = id::MAKE_SELECTION;
}

#[derive(Debug, Clone, Copy)]
pub struct RemoveSelection {
    pub selection_id: u8,
}

impl ProtoEncode for RemoveSelection {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.selection_id);
    }
}

impl Packet for RemoveSelection {
    const ID: u8 = id::REMOVE_SELECTION;
}
