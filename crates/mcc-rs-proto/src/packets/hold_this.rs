//! HoldThis (0x14) — Server → Client.

use bytes::BufMut;

use crate::codec::{Packet, ProtoEncode};
use crate::packets::id;

/// Forces the block in the player's hand, optionally locking it.
#[derive(Debug, Clone, Copy)]
pub struct HoldThis {
    pub block: u8,
    pub prevent_change: bool,
}

impl ProtoEncode for HoldThis {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.block);
        buf.put_u8(self.prevent_change as u8);
    }
}

impl Packet for HoldThis {
    const ID: u8 = id::HOLD_THIS;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_packet;

    #[test]
    fn encode_hold_this() {
        let pkt = HoldThis {
            block: 20,
            prevent_change: true,
        };
        assert_eq!(&encode_packet(&pkt)[..], &[0x14, 20, 1]);
    }
}
