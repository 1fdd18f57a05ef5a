//! LevelFinalize (0x04) — Server → Client.
//!
//! Ends a level transfer and tells the client the level dimensions.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFinalize {
    pub width: usize,
    pub height: usize,
    pub length: usize,
}

impl ProtoEncode for LevelFinalize {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16(self.width as i16);
        buf.put_i16(self.height as i16);
        buf.put_i16(self.length as i16);
    }
}

impl Packet for LevelFinalize {
    const ID: u8 = id::LEVEL_FINALIZE;
}
