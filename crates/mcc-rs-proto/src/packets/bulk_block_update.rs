//! BulkBlockUpdate (0x26) — Server → Client.
//!
//! Up to 256 block changes in one fixed-size packet. The count byte holds
//! `count - 1`; unused index and block slots are zero.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// Maximum changes per packet.
pub const MAX_BULK_BLOCKS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkBlockUpdate {
    indices: Vec<i32>,
    blocks: Vec<u8>,
}

impl BulkBlockUpdate {
    /// Build from `(level index, block)` pairs. Empty and oversized batches
    /// are rejected.
    pub fn new(changes: &[(i32, u8)]) -> Result<Self, ProtoError> {
        if changes.len() > MAX_BULK_BLOCKS {
            return Err(ProtoError::TooManyBlockChanges(changes.len()));
        }
        if changes.is_empty() {
            return Err(ProtoError::InvalidData("empty block batch".into()));
        }
        Ok(Self {
            indices: changes.iter().map(|&(index, _)| index).collect(),
            blocks: changes.iter().map(|&(_, block)| block).collect(),
        })
    }

    /// Split any number of changes into full packets plus one remainder.
    pub fn batches(changes: &[(i32, u8)]) -> impl Iterator<Item = BulkBlockUpdate> + '_ {
        changes.chunks(MAX_BULK_BLOCKS).map(|chunk| Self {
            indices: chunk.iter().map(|&(index, _)| index).collect(),
            blocks: chunk.iter().map(|&(_, block)| block).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl ProtoEncode for BulkBlockUpdate {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8((self.indices.len() - 1) as u8);
        for &index in &self.indices {
            buf.put_i32(index);
        }
        buf.put_bytes(0, (MAX_BULK_BLOCKS - self.indices.len()) * 4);
        buf.put_slice(&self.blocks);
        buf.put_bytes(0, MAX_BULK_BLOCKS - self.blocks.len());
    }
}

impl Packet for BulkBlockUpdate {
    const ID: u8 = id::BULK_BLOCK_UPDATE;
}
