//! CustomBlockSupportLevel (0x13) — both directions.

use bytes::{Buf, BufMut};

use crate::codec::{ensure_remaining, Packet, ProtoDecode, ProtoEncode};
use crate::error::ProtoError;
use crate::packets::id;

/// Highest custom block level this server knows.
pub const CUSTOM_BLOCKS_LEVEL: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomBlockSupportLevel {
    pub level: u8,
}

impl ProtoEncode for CustomBlockSupportLevel {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.level);
    }
}

impl ProtoDecode for CustomBlockSupportLevel {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtoError> {
        ensure_remaining(buf, 1)?;
        Ok(Self {
            level: buf.get_u8(),
        })
    }
}

impl Packet for CustomBlockSupportLevel {
    const ID: u8 = id::CUSTOM_BLOCK_SUPPORT_LEVEL;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;

    #[test]
    fn encode_and_decode_level() {
        let pkt = CustomBlockSupportLevel {
            level: CUSTOM_BLOCKS_LEVEL,
        };
        let bytes = encode_packet(&pkt);
        assert_eq!(&bytes[..], &[0x13, 1]);
        let decoded = CustomBlockSupportLevel::proto_decode(&mut &bytes[1..]).unwrap();
        assert_eq!(decoded, pkt);
    }
}
