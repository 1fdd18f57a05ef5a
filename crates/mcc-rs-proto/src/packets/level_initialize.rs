//! LevelInitialize (0x02) — Server → Client.
//!
//! Starts a level transfer. With FastMap the packet also carries the total
//! size of the level data so the client can allocate up front.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;

#[derive(Debug, Clone, Copy, Default)]
pub struct LevelInitialize {
    /// Uncompressed block count; only present when FastMap was negotiated.
    pub size: Option<u32>,
}

impl LevelInitialize {
    pub fn classic() -> Self {
        Self { size: None }
    }

    pub fn fast_map(size: u32) -> Self {
        Self { size: Some(size) }
    }
}

impl ProtoEncode for LevelInitialize {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        if let Some(size) = self.size {
            buf.put_i32(size as i32);
        }
    }
}

impl Packet for LevelInitialize {
    const ID: u8 = id::LEVEL_INITIALIZE;
}
