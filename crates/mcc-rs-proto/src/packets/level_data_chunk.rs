//! LevelDataChunk (0x03) — Server → Client.

use bytes::{BufMut, Bytes};

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;

/// Payload bytes per chunk.
pub const CHUNK_SIZE: usize = 1024;

/// One slice of the compressed level. The data field is always 1024 bytes on
/// the wire; `length` tells the client how many of them are real.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDataChunk {
    pub data: Bytes,
    pub percent: u8,
}

impl ProtoEncode for LevelDataChunk {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        let len = self.data.len().min(CHUNK_SIZE);
        buf.put_i16(len as i16);
        buf.put_slice(&self.data[..len]);
        buf.put_bytes(0, CHUNK_SIZE - len);
        buf.put_u8(self.percent);
    }
}

impl Packet for LevelDataChunk {
    const ID: u8 = id::LEVEL_DATA_CHUNK;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;

    #[test]
    fn partial_chunk_is_zero_padded() {
        let pkt = LevelDataChunk {
            data: Bytes::from_static(&[9, 9, 9]),
            percent: 100,
        };
        let bytes = encode_packet(&pkt);
        assert_eq!(bytes.len(), 1028);
        assert_eq!(&bytes[..6], &[0x03, 0, 3, 9, 9, 9]);
        assert!(bytes[6..1027].iter().all(|&b| b == 0));
        assert_eq!(bytes[1027], 100);
    }
}
