//! SetClickDistance (0x12) — Server → Client.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;

/// Reach distance in blocks, sent in 1/32 units.
#[derive(Debug, Clone, Copy)]
pub struct SetClickDistance {
    pub distance: f32,
}

impl ProtoEncode for SetClickDistance {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_i16((self.distance * 32.0) as i16);
    }
}

impl Packet for SetClickDistance {
    const ID: u8 = id::SET_CLICK_DISTANCE;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;

    #[test]
    fn encode_click_distance() {
        let bytes = encode_packet(&SetClickDistance { distance: 5.0 });
        assert_eq!(&bytes[..], &[0x12, 0, 160]);
    }
}
