//! SetBlockClient (0x05, Client → Server) and SetBlock (0x06, Server → Client).

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, Packet, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::packets::id;
use crate::types::BlockPos;

/// Whether the client broke or placed a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockChangeMode {
    Destroy,
    Create,
}

/// A block change requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlockClient {
    pub pos: BlockPos,
    pub mode: BlockChangeMode,
    /// The block in hand; ignored for [`BlockChangeMode::Destroy`].
    pub block: u8,
}

impl SetBlockClient {
    /// The block the level should end up holding.
    pub fn resulting_block(&self) -> u8 {
        match self.mode {
            BlockChangeMode::Destroy => 0,
            BlockChangeMode::Create => self.block,
        }
    }
}

impl ProtoDecode for SetBlockClient {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 8)?;
        let pos = BlockPos::proto_decode(buf)?;
        let mode = match buf.get_u8() {
            0 => BlockChangeMode::Destroy,
            _ => BlockChangeMode::Create,
        };
        let block = buf.get_u8();
        Ok(Self { pos, mode, block })
    }
}

/// Authoritative block update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBlock {
    pub pos: BlockPos,
    pub block: u8,
}

impl ProtoEncode for SetBlock {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        self.pos.proto_encode(buf);
        buf.put_u8(self.block);
    }
}

impl Packet for SetBlock {
    const ID: u8 = id::SET_BLOCK;
}
